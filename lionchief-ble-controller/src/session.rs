//! Connection to one train

use std::sync::Mutex;

use data_encoding::HEXLOWER;
use lionchief_proto::CommandId;

use crate::lighting::Lighting;
use crate::motor::Motor;
use crate::sound::Sound;
use crate::transport::{DeviceHandle, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not connected to a train")]
    NotConnected,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A session with one train.
///
/// `send` takes `&self` so the motor, sound and lighting facades can share
/// the session; connecting and disconnecting need exclusive access. One
/// caller at a time is expected to send.
pub struct Session<T: Transport> {
    transport: T,
    device: DeviceHandle,
    link: Option<T::Link>,
    state: Mutex<ConnectionState>,
}

impl<T: Transport> Session<T> {
    /// Create a disconnected session for a discovered device
    pub fn new(transport: T, device: DeviceHandle) -> Self {
        Self {
            transport,
            device,
            link: None,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    /// Create a session and connect it
    pub async fn open(transport: T, device: DeviceHandle) -> Result<Self, SessionError> {
        let mut session = Self::new(transport, device);
        session.connect().await?;
        Ok(session)
    }

    pub fn device(&self) -> &DeviceHandle {
        &self.device
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Connect to the device. Does nothing when already connected.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }

        log::info!("connecting to {}", self.device);
        self.set_state(ConnectionState::Connecting);

        match self.transport.connect(&self.device).await {
            Ok(link) => {
                self.link = Some(link);
                self.set_state(ConnectionState::Connected);
                log::info!("connected to {}", self.device);
                Ok(())
            }
            Err(e) => {
                self.link = None;
                self.set_state(ConnectionState::Disconnected);
                log::warn!("failed to connect to {}: {e}", self.device);
                Err(e.into())
            }
        }
    }

    fn live_link(&self) -> Result<&T::Link, SessionError> {
        match (self.state(), &self.link) {
            (ConnectionState::Connected, Some(link)) => Ok(link),
            _ => Err(SessionError::NotConnected),
        }
    }

    /// Frame and write one command. Returns once the transport acknowledged
    /// the write; the train itself never answers.
    pub async fn send(&self, command_id: u8, values: &[u8]) -> Result<(), SessionError> {
        let link = self.live_link()?;
        let frame = lionchief_proto::encode(command_id, values);

        log::debug!("sending command: {}", HEXLOWER.encode(&frame));
        if let Err(e) = self.transport.write(link, &frame).await {
            if e.is_link_lost() {
                log::warn!("lost link to {}", self.device);
                self.set_state(ConnectionState::Disconnected);
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// [`send`](Self::send) with the parameter count checked against the command
    pub async fn send_command(
        &self,
        command: CommandId,
        values: &[u8],
    ) -> Result<(), SessionError> {
        if values.len() != command.arity() {
            return Err(SessionError::InvalidArgument(format!(
                "{command:?} takes {} values, got {}",
                command.arity(),
                values.len()
            )));
        }
        self.send(command.as_u8(), values).await
    }

    /// Ask the transport whether the link is still up
    pub async fn is_connected(&self) -> bool {
        let Ok(link) = self.live_link() else {
            return false;
        };

        if self.transport.is_connected(link).await {
            true
        } else {
            log::warn!("link to {} is down", self.device);
            self.set_state(ConnectionState::Disconnected);
            false
        }
    }

    /// Say goodbye to the train and drop the link.
    ///
    /// Does nothing when already disconnected. The goodbye frame is best
    /// effort; the session ends up disconnected either way.
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        let Some(link) = self.link.take() else {
            self.set_state(ConnectionState::Disconnected);
            return Ok(());
        };

        log::info!("disconnecting from {}", self.device);

        if self.state() == ConnectionState::Connected {
            let frame = lionchief_proto::encode(CommandId::Disconnect.as_u8(), &[0, 0]);
            log::debug!("sending command: {}", HEXLOWER.encode(&frame));
            if let Err(e) = self.transport.write(&link, &frame).await {
                log::warn!("disconnect command to {} failed: {e}", self.device);
            }
        }

        self.set_state(ConnectionState::Disconnected);
        self.transport.disconnect(&link).await?;
        Ok(())
    }

    pub fn motor(&self) -> Motor<'_, T> {
        Motor::new(self)
    }

    pub fn sound(&self) -> Sound<'_, T> {
        Sound::new(self)
    }

    pub fn lighting(&self) -> Lighting<'_, T> {
        Lighting::new(self)
    }
}
