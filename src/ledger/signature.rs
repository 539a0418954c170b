// src/ledger/signature.rs — Duplicate-detection keys

use super::{Message, Role};

/// The identity of a message for persistence purposes: role plus
/// whitespace-trimmed content. Case-sensitive, no punctuation folding.
/// Two messages with equal signatures are the same turn; the later one
/// is suppressed everywhere deduplication runs (append, read, sync).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    role: Role,
    content: String,
}

impl Signature {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.trim().to_string(),
        }
    }

    pub fn of(message: &Message) -> Self {
        Self::new(message.role, &message.content)
    }
}
