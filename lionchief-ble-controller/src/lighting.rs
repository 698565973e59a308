//! Headlights

use lionchief_proto::CommandId;

use crate::session::{Session, SessionError};
use crate::transport::Transport;

/// Headlight control of a connected train
pub struct Lighting<'s, T: Transport> {
    session: &'s Session<T>,
}

impl<'s, T: Transport> Lighting<'s, T> {
    pub fn new(session: &'s Session<T>) -> Self {
        Self { session }
    }

    pub async fn set_lights(&self, on: bool) -> Result<(), SessionError> {
        self.session
            .send_command(CommandId::SetLightsState, &[on as u8])
            .await
    }
}
