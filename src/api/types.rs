// src/api/types.rs

use serde::{Deserialize, Serialize};

/// Request body for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Request body for appending a message batch to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendRequest {
    pub messages: Vec<WireMessage>,
    /// Optional title hint; the ledger applies it when non-blank.
    #[serde(default)]
    pub title: Option<String>,
}

/// A candidate turn on the wire. The role is free text here; the ledger
/// normalizes anything that is not exactly "assistant" to "user".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

/// Response for a successful append.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub saved_count: usize,
    pub total_count: i64,
}

/// Response for a successful delete.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
