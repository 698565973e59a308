//! LionChief BLE Controller
//!
//! Finds Lionel LionChief locomotives over Bluetooth Low Energy and drives
//! them: speed, direction, horn, bell, sound levels and lights.
//!
//! # Example
//!
//! ```ignore
//! use lionchief_ble_controller::{discovery, BtleTransport, RetryPolicy, Session};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = BtleTransport::new().await?;
//!     let interval = Duration::from_secs(5);
//!     let train = discovery::discover_one(&transport, interval, RetryPolicy::Unbounded)
//!         .await?
//!         .ok_or("no train found")?;
//!
//!     let mut session = Session::open(transport, train).await?;
//!     session.motor().set_speed(10).await?;
//!     session.sound().set_horn(true).await?;
//!     session.disconnect().await?;
//!     Ok(())
//! }
//! ```

use uuid::Uuid;

pub mod ble;
pub mod command;
pub mod config;
pub mod discovery;
pub mod lighting;
pub mod motor;
pub mod session;
pub mod sound;
pub mod transport;

#[cfg(test)]
mod mock;

pub use ble::{BtleLink, BtleTransport};
pub use command::{CommandSpec, Component, ParseCommandError, TrainCommand};
pub use config::{ConfigError, ControllerConfig, DiscoveryConfig};
pub use discovery::{DiscoveryError, RetryPolicy};
pub use session::{ConnectionState, Session, SessionError};
pub use sound::Level;
pub use transport::{Advertisement, DeviceHandle, Transport, TransportError};

pub use lionchief_proto::CommandId;

/// Service advertised by LionChief locomotives
pub const SERVICE_UUID: Uuid = Uuid::from_u128(lionchief_proto::ble::raw::SERVICE_UUID);

/// Characteristic that accepts command frames
pub const WRITE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(lionchief_proto::ble::raw::WRITE_CHARACTERISTIC_UUID);
