// src/infra/errors.rs — Error types for Wayfarer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WayfarerError {
    // Credential errors, rejected before storage is touched
    #[error("Unauthorized")]
    Unauthorized,

    // Session absent or owned by someone else; same signal either way so
    // non-owners learn nothing about existence
    #[error("Session not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Completion collaborator errors (retriable when transport-level)
    #[error("Completion service error: {message}")]
    Completion { message: String, retriable: bool },

    // Client-to-server sync failed after the bounded retry budget
    #[error("Sync failed after {attempts} attempt(s): {message}")]
    Sync { attempts: u32, message: String },

    #[error("Local cache unreadable: {0}")]
    CacheCorruption(String),

    // Infra
    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WayfarerError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            WayfarerError::Completion {
                retriable: true,
                ..
            } | WayfarerError::Sync { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_completion() {
        let e = WayfarerError::Completion {
            message: "timeout".into(),
            retriable: true,
        };
        assert!(e.is_retriable());
    }

    #[test]
    fn test_not_retriable_unauthorized() {
        assert!(!WayfarerError::Unauthorized.is_retriable());
    }

    #[test]
    fn test_not_found_message_leaks_nothing() {
        // Same text whether the session is absent or owned by another user
        assert_eq!(WayfarerError::NotFound.to_string(), "Session not found");
    }
}
