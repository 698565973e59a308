//! Horn, bell, voice lines and volume levels

use lionchief_proto::{AudioDevice, CommandId, EFFECT_VOLUME_MARKER, LEVELS};

use crate::session::{Session, SessionError};
use crate::transport::Transport;

/// Pitch or volume step, 0 (lowest) to 4 (highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Level(u8);

impl Level {
    pub const MAX: u8 = LEVELS.len() as u8 - 1;

    pub fn index(self) -> u8 {
        self.0
    }

    /// Value sent on the wire
    pub fn byte(self) -> u8 {
        LEVELS[self.0 as usize]
    }
}

impl TryFrom<u8> for Level {
    type Error = SessionError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if index > Self::MAX {
            return Err(SessionError::InvalidArgument(format!(
                "level must be between 0 and {}, got {index}",
                Self::MAX
            )));
        }
        Ok(Self(index))
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sound controls of a connected train
pub struct Sound<'s, T: Transport> {
    session: &'s Session<T>,
}

impl<'s, T: Transport> Sound<'s, T> {
    pub fn new(session: &'s Session<T>) -> Self {
        Self { session }
    }

    async fn set_effect(&self, device: AudioDevice, level: u8) -> Result<(), SessionError> {
        let level = Level::try_from(level)?;
        self.session
            .send_command(
                CommandId::SetEffectVolume,
                &[device as u8, EFFECT_VOLUME_MARKER, level.byte()],
            )
            .await
    }

    pub async fn set_horn(&self, on: bool) -> Result<(), SessionError> {
        self.session.send_command(CommandId::SetHornState, &[on as u8]).await
    }

    pub async fn set_bell(&self, on: bool) -> Result<(), SessionError> {
        self.session.send_command(CommandId::SetBellState, &[on as u8]).await
    }

    pub async fn set_horn_pitch(&self, pitch: u8) -> Result<(), SessionError> {
        self.set_effect(AudioDevice::Horn, pitch).await
    }

    pub async fn set_bell_pitch(&self, pitch: u8) -> Result<(), SessionError> {
        self.set_effect(AudioDevice::Bell, pitch).await
    }

    pub async fn set_voice_line_volume(&self, volume: u8) -> Result<(), SessionError> {
        self.set_effect(AudioDevice::Speech, volume).await
    }

    pub async fn set_engine_volume(&self, volume: u8) -> Result<(), SessionError> {
        self.set_effect(AudioDevice::Engine, volume).await
    }

    pub async fn set_steam_volume(&self, volume: u8) -> Result<(), SessionError> {
        let volume = Level::try_from(volume)?;
        self.session
            .send_command(CommandId::SetSteamVolume, &[volume.byte()])
            .await
    }

    pub async fn play_voice_line(&self) -> Result<(), SessionError> {
        self.session.send_command(CommandId::PlayVoiceLine, &[0, 0]).await
    }
}
