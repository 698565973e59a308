//! In-memory transport for tests
//!
//! Scan passes are scripted; once the script runs out every further sample
//! is empty. Writes, connects and disconnects are recorded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::transport::{Advertisement, DeviceHandle, Transport, TransportError};
use crate::SERVICE_UUID;

pub fn advert(address: &str, services: Vec<Uuid>) -> Advertisement {
    Advertisement {
        address: address.to_string(),
        local_name: None,
        rssi: Some(-60),
        services,
        manufacturer_data: HashMap::new(),
    }
}

pub fn train(address: &str) -> Advertisement {
    advert(address, vec![SERVICE_UUID])
}

pub fn handle(address: &str) -> DeviceHandle {
    train(address).into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLink(pub u32);

#[derive(Default)]
struct State {
    passes: VecDeque<Option<Vec<Advertisement>>>,
    samples: usize,
    scans_started: usize,
    scans_stopped: usize,
    fail_start_scan: bool,
    fail_connect: bool,
    // fail the next N writes; link_lost decides how
    failing_writes: usize,
    link_lost: bool,
    connected: bool,
    connects: usize,
    disconnects: usize,
    writes: Vec<Vec<u8>>,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn push_pass(&self, pass: Vec<Advertisement>) {
        self.state().passes.push_back(Some(pass));
    }

    pub fn push_failed_pass(&self) {
        self.state().passes.push_back(None);
    }

    pub fn fail_start_scan(&self) {
        self.state().fail_start_scan = true;
    }

    pub fn fail_connect(&self) {
        self.state().fail_connect = true;
    }

    pub fn fail_writes(&self, count: usize, link_lost: bool) {
        let mut state = self.state();
        state.failing_writes = count;
        state.link_lost = link_lost;
    }

    /// Simulate the train going out of range
    pub fn drop_link(&self) {
        self.state().connected = false;
    }

    pub fn samples(&self) -> usize {
        self.state().samples
    }

    pub fn scans_started(&self) -> usize {
        self.state().scans_started
    }

    pub fn scans_stopped(&self) -> usize {
        self.state().scans_stopped
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state().disconnects
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state().writes.clone()
    }
}

impl Transport for MockTransport {
    type Link = MockLink;

    async fn start_scan(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.fail_start_scan {
            return Err(TransportError::NoAdapter);
        }
        state.scans_started += 1;
        Ok(())
    }

    async fn advertisements(&self) -> Result<Vec<Advertisement>, TransportError> {
        let mut state = self.state();
        state.samples += 1;
        match state.passes.pop_front() {
            Some(Some(pass)) => Ok(pass),
            Some(None) => Err(TransportError::LinkLost),
            None => Ok(Vec::new()),
        }
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        self.state().scans_stopped += 1;
        Ok(())
    }

    async fn connect(&self, device: &DeviceHandle) -> Result<MockLink, TransportError> {
        let mut state = self.state();
        if state.fail_connect {
            return Err(TransportError::DeviceNotFound(device.address.clone()));
        }
        state.connects += 1;
        state.connected = true;
        Ok(MockLink(state.connects as u32))
    }

    async fn write(&self, _link: &MockLink, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.failing_writes > 0 {
            state.failing_writes -= 1;
            if state.link_lost {
                state.connected = false;
                return Err(TransportError::LinkLost);
            }
            return Err(TransportError::CharacteristicNotFound(crate::WRITE_CHARACTERISTIC_UUID));
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    async fn disconnect(&self, _link: &MockLink) -> Result<(), TransportError> {
        let mut state = self.state();
        state.disconnects += 1;
        state.connected = false;
        Ok(())
    }

    async fn is_connected(&self, _link: &MockLink) -> bool {
        self.state().connected
    }
}
