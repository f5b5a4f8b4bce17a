//! Conversation domain - sessions, turns and their relational records

mod record;
mod turn;

pub use record::{ApplicationLog, DocumentRecord};
pub use turn::{Role, SessionId, Turn};
