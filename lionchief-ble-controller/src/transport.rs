//! Wireless transport abstraction
//!
//! Discovery and sessions only talk to the radio through [`Transport`], so
//! the protocol logic runs the same against `btleplug` and against the test
//! transport.

use std::collections::HashMap;
use std::future::Future;

use uuid::Uuid;

/// One visible device in a scan sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub address: String,
    pub local_name: Option<String>,
    pub rssi: Option<i16>,
    pub services: Vec<Uuid>,
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

impl Advertisement {
    pub fn advertises(&self, service: &Uuid) -> bool {
        self.services.iter().any(|s| s == service)
    }
}

/// A discovered, not yet connected, train
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub address: String,
    pub local_name: Option<String>,
    pub rssi: Option<i16>,
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

impl From<Advertisement> for DeviceHandle {
    fn from(adv: Advertisement) -> Self {
        Self {
            address: adv.address,
            local_name: adv.local_name,
            rssi: adv.rssi,
            manufacturer_data: adv.manufacturer_data,
        }
    }
}

impl std::fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.local_name {
            Some(name) => write!(f, "{} ({})", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("bluetooth error: {0}")]
    Ble(#[from] btleplug::Error),
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("characteristic not found: {0}")]
    CharacteristicNotFound(Uuid),
    #[error("link to device lost")]
    LinkLost,
}

impl TransportError {
    /// True when the error means the connection is gone, not just one failed write
    pub fn is_link_lost(&self) -> bool {
        matches!(
            self,
            TransportError::LinkLost
                | TransportError::Ble(btleplug::Error::NotConnected)
                | TransportError::Ble(btleplug::Error::DeviceNotFound)
        )
    }
}

/// Scanning and connection capability of a BLE stack
pub trait Transport: Send + Sync {
    /// Handle to a live connection, including its write characteristic
    type Link: Clone + Send + Sync;

    fn start_scan(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Devices currently visible to the running scan
    fn advertisements(
        &self,
    ) -> impl Future<Output = Result<Vec<Advertisement>, TransportError>> + Send;

    fn stop_scan(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn connect(
        &self,
        device: &DeviceHandle,
    ) -> impl Future<Output = Result<Self::Link, TransportError>> + Send;

    /// Write one frame and wait for the transport-level acknowledgement
    fn write(
        &self,
        link: &Self::Link,
        bytes: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn disconnect(
        &self,
        link: &Self::Link,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn is_connected(&self, link: &Self::Link) -> impl Future<Output = bool> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_lost_classification() {
        assert!(TransportError::LinkLost.is_link_lost());
        assert!(TransportError::Ble(btleplug::Error::NotConnected).is_link_lost());
        assert!(TransportError::Ble(btleplug::Error::DeviceNotFound).is_link_lost());

        assert!(!TransportError::NoAdapter.is_link_lost());
        assert!(!TransportError::DeviceNotFound("AA:AA:AA:AA:AA:01".into()).is_link_lost());
        assert!(!TransportError::Ble(btleplug::Error::PermissionDenied).is_link_lost());

        let missing = TransportError::CharacteristicNotFound(crate::WRITE_CHARACTERISTIC_UUID);
        assert!(!missing.is_link_lost());
        let timed_out = btleplug::Error::TimedOut(std::time::Duration::from_secs(1));
        assert!(!TransportError::Ble(timed_out).is_link_lost());
    }
}
