//! Domain model (ids, status, envelope, outcome).

pub mod envelope;
pub mod ids;
pub mod outcome;
pub mod state;

pub use self::envelope::{CommandEnvelope, CommandKind};
pub use self::ids::CommandId;
pub use self::outcome::Outcome;
pub use self::state::CommandStatus;
