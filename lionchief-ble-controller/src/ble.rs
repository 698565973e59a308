//! btleplug implementation of [`Transport`]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};

use crate::transport::{Advertisement, DeviceHandle, Transport, TransportError};
use crate::WRITE_CHARACTERISTIC_UUID;

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, TransportError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(TransportError::NoAdapter)
}

/// Connected train: the peripheral and its command characteristic
#[derive(Debug, Clone)]
pub struct BtleLink {
    peripheral: Peripheral,
    write_char: Characteristic,
}

/// BLE transport on top of the platform adapter
#[derive(Clone)]
pub struct BtleTransport {
    adapter: Adapter,
    // peripherals seen while sampling, by address
    seen: Arc<Mutex<HashMap<String, Peripheral>>>,
}

impl BtleTransport {
    /// Use the first Bluetooth adapter of the system
    pub async fn new() -> Result<Self, TransportError> {
        Ok(Self::with_adapter(get_adapter().await?))
    }

    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            seen: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn remember(&self, address: &str, peripheral: &Peripheral) {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.insert(address.to_string(), peripheral.clone());
    }

    fn cached(&self, address: &str) -> Option<Peripheral> {
        let seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.get(address).cloned()
    }

    async fn find_peripheral(&self, address: &str) -> Result<Peripheral, TransportError> {
        if let Some(peripheral) = self.cached(address) {
            return Ok(peripheral);
        }

        for peripheral in self.adapter.peripherals().await? {
            if peripheral.address().to_string() == address {
                self.remember(address, &peripheral);
                return Ok(peripheral);
            }
        }

        Err(TransportError::DeviceNotFound(address.to_string()))
    }
}

impl Transport for BtleTransport {
    type Link = BtleLink;

    async fn start_scan(&self) -> Result<(), TransportError> {
        // filtering by service happens in discovery, some stacks drop
        // 128-bit service filters silently
        self.adapter.start_scan(ScanFilter::default()).await?;
        Ok(())
    }

    async fn advertisements(&self) -> Result<Vec<Advertisement>, TransportError> {
        let peripherals = self.adapter.peripherals().await?;
        let mut devices = Vec::with_capacity(peripherals.len());

        for peripheral in peripherals {
            if let Some(props) = peripheral.properties().await? {
                let address = peripheral.address().to_string();
                self.remember(&address, &peripheral);

                devices.push(Advertisement {
                    address,
                    local_name: props.local_name,
                    rssi: props.rssi,
                    services: props.services,
                    manufacturer_data: props.manufacturer_data,
                });
            }
        }

        Ok(devices)
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        self.adapter.stop_scan().await?;
        Ok(())
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<BtleLink, TransportError> {
        let peripheral = self.find_peripheral(&device.address).await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let write_char = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == WRITE_CHARACTERISTIC_UUID);

        match write_char {
            Some(write_char) => Ok(BtleLink { peripheral, write_char }),
            None => {
                let _ = peripheral.disconnect().await;
                Err(TransportError::CharacteristicNotFound(WRITE_CHARACTERISTIC_UUID))
            }
        }
    }

    async fn write(&self, link: &BtleLink, bytes: &[u8]) -> Result<(), TransportError> {
        link.peripheral
            .write(&link.write_char, bytes, WriteType::WithResponse)
            .await?;
        Ok(())
    }

    async fn disconnect(&self, link: &BtleLink) -> Result<(), TransportError> {
        link.peripheral.disconnect().await?;
        Ok(())
    }

    async fn is_connected(&self, link: &BtleLink) -> bool {
        link.peripheral.is_connected().await.unwrap_or(false)
    }
}
