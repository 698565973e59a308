//! Speed and direction

use lionchief_proto::{CommandId, DIRECTION_FORWARD, DIRECTION_REVERSE};

use crate::session::{Session, SessionError};
use crate::transport::Transport;

/// Motor controls of a connected train
pub struct Motor<'s, T: Transport> {
    session: &'s Session<T>,
}

impl<'s, T: Transport> Motor<'s, T> {
    pub fn new(session: &'s Session<T>) -> Self {
        Self { session }
    }

    pub async fn set_speed(&self, speed: u8) -> Result<(), SessionError> {
        self.session.send_command(CommandId::SetSpeed, &[speed]).await
    }

    pub async fn set_movement_direction(&self, forward: bool) -> Result<(), SessionError> {
        let direction = if forward { DIRECTION_FORWARD } else { DIRECTION_REVERSE };
        self.session
            .send_command(CommandId::SetMovementDirection, &[direction])
            .await
    }
}
