//! Named train commands
//!
//! Text form is `<component>,<method>[,<arg>...]`, e.g. `motor,set_speed,10`
//! or `sound,set_horn_pitch,3`.

use std::fmt;
use std::str::FromStr;

use crate::session::{Session, SessionError};
use crate::sound::Level;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainCommand {
    SetSpeed(u8),
    SetMovementDirection { forward: bool },
    SetHorn(bool),
    SetBell(bool),
    SetHornPitch(Level),
    SetBellPitch(Level),
    SetSteamVolume(Level),
    SetVoiceLineVolume(Level),
    SetEngineVolume(Level),
    PlayVoiceLine,
    SetLights(bool),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("expected <component>,<method>[,<args>...], got {0:?}")]
    Malformed(String),
    #[error("unknown command: {component}.{method}")]
    Unknown { component: String, method: String },
    #[error("{command} takes {expected} argument(s), got {got}")]
    Arity {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid argument {value:?}: {reason}")]
    Argument { value: String, reason: String },
}

/// Subsystem a command belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Motor,
    Sound,
    Lighting,
}

impl Component {
    pub fn name(self) -> &'static str {
        match self {
            Component::Motor => "motor",
            Component::Sound => "sound",
            Component::Lighting => "lighting",
        }
    }
}

/// Argument a command takes in text form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    None,
    Byte,
    Bool,
    Level,
}

impl Arg {
    pub fn count(self) -> usize {
        match self {
            Arg::None => 0,
            Arg::Byte | Arg::Bool | Arg::Level => 1,
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Arg::None => "",
            Arg::Byte => "<0-255>",
            Arg::Bool => "<bool>",
            Arg::Level => "<0-4>",
        }
    }
}

/// One row of the command table: its text name and how to build it
pub struct CommandSpec {
    pub component: Component,
    pub method: &'static str,
    pub arg: Arg,
    build: fn(&[&str]) -> Result<TrainCommand, ParseCommandError>,
}

impl CommandSpec {
    /// `component,method[,hint]`
    pub fn usage(&self) -> String {
        match self.arg {
            Arg::None => format!("{},{}", self.component.name(), self.method),
            arg => format!("{},{},{}", self.component.name(), self.method, arg.hint()),
        }
    }
}

/// Every command understood in text form
pub static COMMANDS: [CommandSpec; 11] = [
    CommandSpec {
        component: Component::Motor,
        method: "set_speed",
        arg: Arg::Byte,
        build: |a| Ok(TrainCommand::SetSpeed(parse_u8(a[0])?)),
    },
    CommandSpec {
        component: Component::Motor,
        method: "set_movement_direction",
        arg: Arg::Bool,
        build: |a| Ok(TrainCommand::SetMovementDirection { forward: parse_bool(a[0])? }),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_horn",
        arg: Arg::Bool,
        build: |a| Ok(TrainCommand::SetHorn(parse_bool(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_bell",
        arg: Arg::Bool,
        build: |a| Ok(TrainCommand::SetBell(parse_bool(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_horn_pitch",
        arg: Arg::Level,
        build: |a| Ok(TrainCommand::SetHornPitch(parse_level(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_bell_pitch",
        arg: Arg::Level,
        build: |a| Ok(TrainCommand::SetBellPitch(parse_level(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_steam_volume",
        arg: Arg::Level,
        build: |a| Ok(TrainCommand::SetSteamVolume(parse_level(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_voice_line_volume",
        arg: Arg::Level,
        build: |a| Ok(TrainCommand::SetVoiceLineVolume(parse_level(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "set_engine_volume",
        arg: Arg::Level,
        build: |a| Ok(TrainCommand::SetEngineVolume(parse_level(a[0])?)),
    },
    CommandSpec {
        component: Component::Sound,
        method: "play_voice_line",
        arg: Arg::None,
        build: |_| Ok(TrainCommand::PlayVoiceLine),
    },
    CommandSpec {
        component: Component::Lighting,
        method: "set_lights",
        arg: Arg::Bool,
        build: |a| Ok(TrainCommand::SetLights(parse_bool(a[0])?)),
    },
];

fn parse_bool(s: &str) -> Result<bool, ParseCommandError> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(ParseCommandError::Argument {
            value: s.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}

fn parse_u8(s: &str) -> Result<u8, ParseCommandError> {
    s.parse().map_err(|e: std::num::ParseIntError| ParseCommandError::Argument {
        value: s.to_string(),
        reason: e.to_string(),
    })
}

fn parse_level(s: &str) -> Result<Level, ParseCommandError> {
    Level::try_from(parse_u8(s)?).map_err(|e| ParseCommandError::Argument {
        value: s.to_string(),
        reason: e.to_string(),
    })
}

impl TrainCommand {
    pub fn component(&self) -> Component {
        match self {
            TrainCommand::SetSpeed(_) | TrainCommand::SetMovementDirection { .. } => {
                Component::Motor
            }
            TrainCommand::SetHorn(_)
            | TrainCommand::SetBell(_)
            | TrainCommand::SetHornPitch(_)
            | TrainCommand::SetBellPitch(_)
            | TrainCommand::SetSteamVolume(_)
            | TrainCommand::SetVoiceLineVolume(_)
            | TrainCommand::SetEngineVolume(_)
            | TrainCommand::PlayVoiceLine => Component::Sound,
            TrainCommand::SetLights(_) => Component::Lighting,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            TrainCommand::SetSpeed(_) => "set_speed",
            TrainCommand::SetMovementDirection { .. } => "set_movement_direction",
            TrainCommand::SetHorn(_) => "set_horn",
            TrainCommand::SetBell(_) => "set_bell",
            TrainCommand::SetHornPitch(_) => "set_horn_pitch",
            TrainCommand::SetBellPitch(_) => "set_bell_pitch",
            TrainCommand::SetSteamVolume(_) => "set_steam_volume",
            TrainCommand::SetVoiceLineVolume(_) => "set_voice_line_volume",
            TrainCommand::SetEngineVolume(_) => "set_engine_volume",
            TrainCommand::PlayVoiceLine => "play_voice_line",
            TrainCommand::SetLights(_) => "set_lights",
        }
    }

    /// Send the command through the matching facade
    pub async fn execute<T: Transport>(&self, session: &Session<T>) -> Result<(), SessionError> {
        match *self {
            TrainCommand::SetSpeed(speed) => session.motor().set_speed(speed).await,
            TrainCommand::SetMovementDirection { forward } => {
                session.motor().set_movement_direction(forward).await
            }
            TrainCommand::SetHorn(on) => session.sound().set_horn(on).await,
            TrainCommand::SetBell(on) => session.sound().set_bell(on).await,
            TrainCommand::SetHornPitch(l) => session.sound().set_horn_pitch(l.index()).await,
            TrainCommand::SetBellPitch(l) => session.sound().set_bell_pitch(l.index()).await,
            TrainCommand::SetSteamVolume(l) => session.sound().set_steam_volume(l.index()).await,
            TrainCommand::SetVoiceLineVolume(l) => {
                session.sound().set_voice_line_volume(l.index()).await
            }
            TrainCommand::SetEngineVolume(l) => session.sound().set_engine_volume(l.index()).await,
            TrainCommand::PlayVoiceLine => session.sound().play_voice_line().await,
            TrainCommand::SetLights(on) => session.lighting().set_lights(on).await,
        }
    }
}

impl FromStr for TrainCommand {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(ParseCommandError::Malformed(s.to_string()));
        }

        let (component, method, args) = (parts[0], parts[1], &parts[2..]);
        let Some(spec) = COMMANDS
            .iter()
            .find(|c| c.component.name() == component && c.method == method)
        else {
            return Err(ParseCommandError::Unknown {
                component: component.to_string(),
                method: method.to_string(),
            });
        };

        if args.len() != spec.arg.count() {
            return Err(ParseCommandError::Arity {
                command: spec.method,
                expected: spec.arg.count(),
                got: args.len(),
            });
        }

        (spec.build)(args)
    }
}

impl fmt::Display for TrainCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.component().name(), self.method())?;
        match self {
            TrainCommand::SetSpeed(v) => write!(f, ",{v}"),
            TrainCommand::SetMovementDirection { forward } => write!(f, ",{forward}"),
            TrainCommand::SetHorn(on) | TrainCommand::SetBell(on) | TrainCommand::SetLights(on) => {
                write!(f, ",{on}")
            }
            TrainCommand::SetHornPitch(l)
            | TrainCommand::SetBellPitch(l)
            | TrainCommand::SetSteamVolume(l)
            | TrainCommand::SetVoiceLineVolume(l)
            | TrainCommand::SetEngineVolume(l) => write!(f, ",{l}"),
            TrainCommand::PlayVoiceLine => Ok(()),
        }
    }
}
