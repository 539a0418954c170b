// src/client/remote.rs — HTTP transport to the ledger server

use async_trait::async_trait;

use crate::api::types::{AppendRequest, AppendResponse, DeleteResponse, ErrorResponse, WireMessage};
use crate::infra::errors::WayfarerError;
use crate::ledger::{AppendOutcome, Message, MessageDraft, Session};

/// The slice of the server surface the sync agent needs. Kept as a trait
/// so sync behavior is testable against an in-process fake.
#[async_trait]
pub trait RemoteLedger: Send + Sync {
    async fn append_messages(
        &self,
        session_id: &str,
        batch: &[MessageDraft],
        title_hint: Option<&str>,
    ) -> Result<AppendOutcome, WayfarerError>;
}

/// Full client for the ledger server's HTTP surface.
pub struct HttpRemote {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, WayfarerError> {
        let resp = self
            .client
            .get(format!("{}/sessions", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(transport_error)
    }

    pub async fn create_session(&self, title: Option<&str>) -> Result<Session, WayfarerError> {
        let resp = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(transport_error)
    }

    pub async fn read_messages(&self, session_id: &str) -> Result<Vec<Message>, WayfarerError> {
        let resp = self
            .client
            .get(format!("{}/sessions/{session_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_status(resp).await?;
        resp.json().await.map_err(transport_error)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<bool, WayfarerError> {
        let resp = self
            .client
            .delete(format!("{}/sessions/{session_id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_status(resp).await?;
        let body: DeleteResponse = resp.json().await.map_err(transport_error)?;
        Ok(body.success)
    }
}

#[async_trait]
impl RemoteLedger for HttpRemote {
    async fn append_messages(
        &self,
        session_id: &str,
        batch: &[MessageDraft],
        title_hint: Option<&str>,
    ) -> Result<AppendOutcome, WayfarerError> {
        let request = AppendRequest {
            messages: batch
                .iter()
                .map(|d| WireMessage {
                    role: d.role.as_str().to_string(),
                    content: d.content.clone(),
                })
                .collect(),
            title: title_hint.map(str::to_string),
        };

        let resp = self
            .client
            .post(format!("{}/sessions/{session_id}/messages", self.base_url))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let resp = check_status(resp).await?;
        let body: AppendResponse = resp.json().await.map_err(transport_error)?;

        Ok(AppendOutcome {
            saved_count: body.saved_count,
            total_count: body.total_count,
        })
    }
}

fn transport_error(e: reqwest::Error) -> WayfarerError {
    WayfarerError::Other(anyhow::anyhow!("transport error: {e}"))
}

/// Map error statuses back into the taxonomy; pass successes through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, WayfarerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = resp
        .json::<ErrorResponse>()
        .await
        .map(|e| e.error)
        .unwrap_or_else(|_| status.to_string());

    Err(match status.as_u16() {
        401 => WayfarerError::Unauthorized,
        404 => WayfarerError::NotFound,
        400 => WayfarerError::InvalidInput(message),
        _ => WayfarerError::Other(anyhow::anyhow!("server error {status}: {message}")),
    })
}
