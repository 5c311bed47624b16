//! Row models used by the session repository.

use chrono::{DateTime, Utc};

/// One key of one tab session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub session_id: String,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
