// src/client/mod.rs — Client-side mirror: cache, remote transport, sync

pub mod cache;
pub mod remote;
pub mod sync;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::Role;

/// A turn as the client holds it before the ledger has confirmed it:
/// locally-assigned id and timestamp, no sequence number yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl LocalMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: format!("msg-{}", uuid::Uuid::new_v4()),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
