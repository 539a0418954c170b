// src/client/sync.rs — Incremental client→server synchronization
//
// Tracks, per active session, how many locally-known messages have
// already been handed to the ledger (the watermark) and sends only the
// suffix beyond it. Retrying is always safe: the ledger deduplicates by
// content, so at-least-once delivery converges to effectively-once
// storage.

use std::sync::Arc;

use super::remote::RemoteLedger;
use super::LocalMessage;
use crate::infra::errors::WayfarerError;
use crate::ledger::signature::Signature;
use crate::ledger::{title, MessageDraft, Role, Session, DEFAULT_TITLE};

/// Transport failures are retried this many times per sync, then
/// surfaced for manual retry.
pub const MAX_SYNC_ATTEMPTS: u32 = 3;

/// Watermark cursor for one session: how many of the locally-known
/// messages are already confirmed handed to the ledger. Always keyed by
/// session id and passed through the sync call, never a bare shared
/// counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncCursor {
    pub session_id: String,
    pub sent: usize,
}

impl SyncCursor {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sent: 0,
        }
    }
}

/// What a sync call did, distinguishing "nothing to do" from work done.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Every local message was already covered by the watermark.
    NothingToSend,
    Synced {
        /// Messages in the batch that went over the wire.
        sent: usize,
        /// Batch members the ledger actually stored.
        saved_count: usize,
        /// The session's message total after the append.
        total_count: i64,
        /// Title hint that was delivered alongside the batch, if any.
        applied_title: Option<String>,
    },
}

pub struct SyncAgent {
    remote: Arc<dyn RemoteLedger>,
    cursor: Option<SyncCursor>,
}

impl SyncAgent {
    pub fn new(remote: Arc<dyn RemoteLedger>) -> Self {
        Self {
            remote,
            cursor: None,
        }
    }

    /// Make a session the active sync target. Switching sessions always
    /// starts from a fresh cursor, even when returning to a session that
    /// was active earlier; the ledger's dedup absorbs the resend.
    pub fn activate(&mut self, session_id: &str) {
        match &self.cursor {
            Some(cursor) if cursor.session_id == session_id => {}
            _ => self.cursor = Some(SyncCursor::new(session_id)),
        }
    }

    /// Drop all sync state (logout).
    pub fn logout(&mut self) {
        self.cursor = None;
    }

    /// Current watermark for a session; 0 when it is not the active one.
    pub fn watermark(&self, session_id: &str) -> usize {
        match &self.cursor {
            Some(cursor) if cursor.session_id == session_id => cursor.sent,
            _ => 0,
        }
    }

    /// Push the unsent suffix of `local` to the ledger.
    ///
    /// On success the watermark advances past everything known locally at
    /// send time; on failure it stays put, so the same suffix is retried
    /// next call.
    pub async fn sync(
        &mut self,
        session: &Session,
        local: &[LocalMessage],
    ) -> Result<SyncOutcome, WayfarerError> {
        let cursor = match self.cursor.take() {
            Some(cursor) if cursor.session_id == session.id => cursor,
            _ => SyncCursor::new(&session.id),
        };

        let (cursor, result) = self.sync_with_cursor(cursor, session, local).await;
        self.cursor = Some(cursor);
        result
    }

    async fn sync_with_cursor(
        &self,
        mut cursor: SyncCursor,
        session: &Session,
        local: &[LocalMessage],
    ) -> (SyncCursor, Result<SyncOutcome, WayfarerError>) {
        // UI layers can emit the same turn twice back to back; collapse
        // those before slicing so they never count against the watermark.
        let collapsed = collapse_adjacent(local);

        let start = cursor.sent.min(collapsed.len());
        let batch: Vec<MessageDraft> = collapsed[start..]
            .iter()
            .map(|m| MessageDraft::new(m.role, m.content.clone()))
            .collect();

        if batch.is_empty() {
            return (cursor, Ok(SyncOutcome::NothingToSend));
        }

        let title_hint = derive_title_hint(session, local);

        let mut last_error: Option<WayfarerError> = None;
        for attempt in 1..=MAX_SYNC_ATTEMPTS {
            match self
                .remote
                .append_messages(&session.id, &batch, title_hint.as_deref())
                .await
            {
                Ok(outcome) => {
                    // Advance past everything known locally at send time,
                    // not just the survivors: messages the ledger already
                    // had must not be resubmitted either.
                    cursor.sent = collapsed.len();
                    return (
                        cursor,
                        Ok(SyncOutcome::Synced {
                            sent: batch.len(),
                            saved_count: outcome.saved_count,
                            total_count: outcome.total_count,
                            applied_title: title_hint,
                        }),
                    );
                }
                Err(e) if !should_retry(&e) => return (cursor, Err(e)),
                Err(e) => {
                    tracing::warn!("sync attempt {attempt}/{MAX_SYNC_ATTEMPTS} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".into());
        (
            cursor,
            Err(WayfarerError::Sync {
                attempts: MAX_SYNC_ATTEMPTS,
                message,
            }),
        )
    }
}

/// Drop any message whose signature equals the immediately preceding one.
fn collapse_adjacent(local: &[LocalMessage]) -> Vec<&LocalMessage> {
    let mut result: Vec<&LocalMessage> = Vec::with_capacity(local.len());
    let mut prev: Option<Signature> = None;
    for message in local {
        let sig = Signature::new(message.role, &message.content);
        if prev.as_ref() != Some(&sig) {
            result.push(message);
        }
        prev = Some(sig);
    }
    result
}

/// A title hint is sent while the session still carries the placeholder
/// title, derived from the first user message of the full local list.
/// The ledger decides whether to apply it.
fn derive_title_hint(session: &Session, local: &[LocalMessage]) -> Option<String> {
    if session.title != DEFAULT_TITLE {
        return None;
    }
    local
        .iter()
        .find(|m| m.role == Role::User)
        .map(|m| title::synthesize(&m.content))
}

/// Logical rejections are final; everything else (transport, server-side
/// storage failure) is worth another attempt.
fn should_retry(error: &WayfarerError) -> bool {
    !matches!(
        error,
        WayfarerError::Unauthorized | WayfarerError::NotFound | WayfarerError::InvalidInput(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_adjacent_duplicates() {
        let local = vec![
            LocalMessage::user("hello"),
            LocalMessage::user("hello"),
            LocalMessage::assistant("hi!"),
            LocalMessage::user("hello"),
        ];
        let collapsed = collapse_adjacent(&local);
        assert_eq!(collapsed.len(), 3);
        assert_eq!(collapsed[0].content, "hello");
        assert_eq!(collapsed[1].content, "hi!");
        // Non-adjacent repeat survives the pre-filter; the ledger's
        // full-set dedup handles it.
        assert_eq!(collapsed[2].content, "hello");
    }

    #[test]
    fn test_collapse_respects_role() {
        let local = vec![LocalMessage::user("hello"), LocalMessage::assistant("hello")];
        assert_eq!(collapse_adjacent(&local).len(), 2);
    }

    #[test]
    fn test_should_retry_classification() {
        assert!(!should_retry(&WayfarerError::Unauthorized));
        assert!(!should_retry(&WayfarerError::NotFound));
        assert!(!should_retry(&WayfarerError::InvalidInput("empty".into())));
        assert!(should_retry(&WayfarerError::Other(anyhow::anyhow!(
            "connection refused"
        ))));
    }

    #[test]
    fn test_watermark_defaults_to_zero() {
        struct NoRemote;
        #[async_trait::async_trait]
        impl RemoteLedger for NoRemote {
            async fn append_messages(
                &self,
                _session_id: &str,
                _batch: &[MessageDraft],
                _title_hint: Option<&str>,
            ) -> Result<crate::ledger::AppendOutcome, WayfarerError> {
                unreachable!("not called in this test")
            }
        }

        let mut agent = SyncAgent::new(Arc::new(NoRemote));
        assert_eq!(agent.watermark("s-1"), 0);
        agent.activate("s-1");
        assert_eq!(agent.watermark("s-1"), 0);
        assert_eq!(agent.watermark("s-2"), 0);
    }
}
