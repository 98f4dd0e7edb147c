//! Outcome model: what a successful execution hands back to the worker.
//!
//! Returning an `Outcome` is the completion signal. Handlers never touch the
//! store; follow-up commands travel back in the outcome and the worker
//! inserts them before marking the parent complete.

use super::envelope::CommandEnvelope;
use crate::error::CodecError;
use crate::typed::Command;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    follow_ups: Vec<CommandEnvelope>,
}

impl Outcome {
    /// Finished with no derived work.
    pub fn done() -> Self {
        Self::default()
    }

    pub fn with_follow_up(mut self, envelope: CommandEnvelope) -> Self {
        self.follow_ups.push(envelope);
        self
    }

    /// Typed variant of [`Outcome::with_follow_up`].
    pub fn enqueue<C: Command>(self, command: &C) -> Result<Self, CodecError> {
        Ok(self.with_follow_up(CommandEnvelope::from_command(command)?))
    }

    pub fn follow_ups(&self) -> &[CommandEnvelope] {
        &self.follow_ups
    }

    pub fn into_follow_ups(self) -> Vec<CommandEnvelope> {
        self.follow_ups
    }
}
