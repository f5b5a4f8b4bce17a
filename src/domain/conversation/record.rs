use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{SessionId, Turn};

/// A persisted question/answer exchange (`application_logs` row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationLog {
    pub id: i64,
    pub session_id: SessionId,
    pub user_query: String,
    pub gpt_response: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl ApplicationLog {
    /// Expands the row into its user turn followed by its assistant turn
    pub fn into_turns(self) -> [Turn; 2] {
        [
            Turn::user(self.user_query).with_created_at(self.created_at),
            Turn::assistant(self.gpt_response).with_created_at(self.created_at),
        ]
    }
}

/// An uploaded document (`document_store` row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub filename: String,
    pub session_id: Option<SessionId>,
    pub upload_timestamp: DateTime<Utc>,
}
