//! LionChief wire protocol - command ids and framing
//!
//! Every command is a single write of
//! `[0x00, command_id, value_0 .. value_n, checksum]` where the checksum makes
//! the byte sum of everything after the header zero modulo 256.

pub mod ble;

/// Leading byte of every frame
pub const FRAME_HEADER: u8 = 0x00;

/// Header, command id and checksum
pub const FRAME_OVERHEAD: usize = 3;

/// Pitch/volume level index (0..=4) to wire byte
pub const LEVELS: [u8; 5] = [0xfe, 0xff, 0x00, 0x01, 0x02];

/// Second parameter of every SetEffectVolume frame
pub const EFFECT_VOLUME_MARKER: u8 = 0x0e;

// Direction values
pub const DIRECTION_FORWARD: u8 = 0x01;
pub const DIRECTION_REVERSE: u8 = 0x02;

/// Command ids understood by the locomotive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Effect level for an [`AudioDevice`]; also used for bell and horn pitch
    SetEffectVolume = 0x44,
    SetSpeed = 0x45,
    SetMovementDirection = 0x46,
    SetBellState = 0x47,
    SetHornState = 0x48,
    Disconnect = 0x4b,
    SetSteamVolume = 0x4c,
    PlayVoiceLine = 0x4d,
    SetLightsState = 0x51,
}

impl CommandId {
    pub const ALL: [CommandId; 9] = [
        CommandId::SetEffectVolume,
        CommandId::SetSpeed,
        CommandId::SetMovementDirection,
        CommandId::SetBellState,
        CommandId::SetHornState,
        CommandId::Disconnect,
        CommandId::SetSteamVolume,
        CommandId::PlayVoiceLine,
        CommandId::SetLightsState,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Number of parameter bytes the locomotive expects after the id
    pub fn arity(self) -> usize {
        match self {
            CommandId::SetEffectVolume => 3,
            CommandId::Disconnect | CommandId::PlayVoiceLine => 2,
            CommandId::SetSpeed
            | CommandId::SetMovementDirection
            | CommandId::SetBellState
            | CommandId::SetHornState
            | CommandId::SetSteamVolume
            | CommandId::SetLightsState => 1,
        }
    }

    pub fn from_u8(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_u8() == id)
    }
}

/// Sound sources addressed by SetEffectVolume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AudioDevice {
    Horn = 0x01,
    Bell = 0x02,
    Speech = 0x03,
    Engine = 0x04,
}

/// Checksum byte for a command id and its parameters
pub fn checksum(command_id: u8, values: &[u8]) -> u8 {
    let sum = values.iter().fold(command_id, |acc, v| acc.wrapping_add(*v));
    0u8.wrapping_sub(sum)
}

/// Build the frame for one command.
///
/// The encoder does not know about arity; callers check parameter counts.
pub fn encode(command_id: u8, values: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() + FRAME_OVERHEAD);
    buf.push(FRAME_HEADER);
    buf.push(command_id);
    buf.extend_from_slice(values);
    buf.push(checksum(command_id, values));
    buf
}

/// Check header, minimum length and checksum of a complete frame
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < FRAME_OVERHEAD || frame[0] != FRAME_HEADER {
        return false;
    }
    frame[1..].iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) == 0
}
