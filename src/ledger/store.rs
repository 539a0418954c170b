// src/ledger/store.rs — SQLite operations for sessions and messages

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;

use super::signature::Signature;
use super::{AppendOutcome, Message, MessageDraft, Role, Session, DEFAULT_TITLE};
use crate::infra::errors::WayfarerError;
use crate::util::truncate_chars;

/// Previews keep at most this many characters of the newest message.
const PREVIEW_CHARS: usize = 100;

/// Low-level SQLite operations for the session ledger.
///
/// All methods take the requesting user id and answer `NotFound` for a
/// session that is absent *or* owned by someone else; callers cannot
/// distinguish the two cases.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    // -- Sessions --

    pub fn create_session(
        &self,
        owner_id: &str,
        title: Option<&str>,
    ) -> Result<Session, WayfarerError> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);
        let now = Utc::now();

        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
            message_count: 0,
            last_message_preview: None,
        };

        self.conn.execute(
            "INSERT INTO sessions (id, owner_id, title, created_at, updated_at, message_count)
             VALUES (?1, ?2, ?3, ?4, ?4, 0)",
            params![session.id, session.owner_id, session.title, encode_ts(&now)],
        )?;

        Ok(session)
    }

    pub fn list_sessions(&self, owner_id: &str) -> Result<Vec<Session>, WayfarerError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, title, created_at, updated_at, message_count, last_message_preview
             FROM sessions WHERE owner_id = ?1
             ORDER BY updated_at DESC",
        )?;

        let rows = stmt.query_map(params![owner_id], session_from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    pub fn get_session(&self, id: &str, owner_id: &str) -> Result<Session, WayfarerError> {
        let session = self
            .conn
            .query_row(
                "SELECT id, owner_id, title, created_at, updated_at, message_count, last_message_preview
                 FROM sessions WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
                session_from_row,
            )
            .optional()?;

        session.ok_or(WayfarerError::NotFound)
    }

    /// Delete a session and every message in it.
    pub fn delete_session(&self, id: &str, owner_id: &str) -> Result<(), WayfarerError> {
        let tx = self.conn.unchecked_transaction()?;

        let owned: Option<String> = tx
            .query_row(
                "SELECT id FROM sessions WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(WayfarerError::NotFound);
        }

        // Messages first, then the session row
        tx.execute("DELETE FROM messages WHERE session_id = ?1", params![id])?;
        tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    // -- Messages --

    /// Append a batch of candidate turns, suppressing duplicates.
    ///
    /// Deduplication re-scans the session's full stored set on every call,
    /// so delivering the same batch twice converges to the same state:
    /// the second call reports `saved_count = 0` and an unchanged total.
    /// Candidates that repeat a signature earlier in the same batch are
    /// also dropped (first occurrence wins).
    ///
    /// Survivors get `timestamp = base + index` milliseconds and the next
    /// values of the per-session `seq` counter, keeping read-back order
    /// equal to submission order even within a single millisecond.
    pub fn append_messages(
        &self,
        session_id: &str,
        requester_id: &str,
        candidates: &[MessageDraft],
        title_hint: Option<&str>,
    ) -> Result<AppendOutcome, WayfarerError> {
        if candidates.is_empty() {
            return Err(WayfarerError::InvalidInput(
                "message batch cannot be empty".into(),
            ));
        }

        let tx = self.conn.unchecked_transaction()?;

        let owned: Option<String> = tx
            .query_row(
                "SELECT id FROM sessions WHERE id = ?1 AND owner_id = ?2",
                params![session_id, requester_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(WayfarerError::NotFound);
        }

        // Signatures of everything already stored for this session
        let mut seen: HashSet<Signature> = {
            let mut stmt = tx.prepare(
                "SELECT role, content FROM messages WHERE session_id = ?1
                 ORDER BY timestamp, seq",
            )?;
            let rows = stmt.query_map(params![session_id], |row| {
                let role: String = row.get(0)?;
                let content: String = row.get(1)?;
                Ok(Signature::new(Role::normalize(&role), &content))
            })?;
            let mut set = HashSet::new();
            for row in rows {
                set.insert(row?);
            }
            set
        };

        // First occurrence wins, within the batch and against the store
        let survivors: Vec<&MessageDraft> = candidates
            .iter()
            .filter(|draft| seen.insert(Signature::new(draft.role, &draft.content)))
            .collect();

        let base = Utc::now();
        let max_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;

        for (i, draft) in survivors.iter().enumerate() {
            let timestamp = base + chrono::Duration::milliseconds(i as i64);
            tx.execute(
                "INSERT INTO messages (id, session_id, role, content, timestamp, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    session_id,
                    draft.role.as_str(),
                    draft.content.trim(),
                    encode_ts(&timestamp),
                    max_seq + 1 + i as i64,
                ],
            )?;
        }

        // Recompute metadata from live rows, never from the batch
        let total_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;

        let preview: Option<String> = tx
            .query_row(
                "SELECT content FROM messages WHERE session_id = ?1
                 ORDER BY timestamp DESC, seq DESC LIMIT 1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        let preview = preview.map(|p| truncate_chars(&p, PREVIEW_CHARS).to_string());

        tx.execute(
            "UPDATE sessions SET updated_at = ?1, message_count = ?2, last_message_preview = ?3
             WHERE id = ?4",
            params![encode_ts(&Utc::now()), total_count, preview, session_id],
        )?;

        if let Some(hint) = title_hint.map(str::trim).filter(|h| !h.is_empty()) {
            tx.execute(
                "UPDATE sessions SET title = ?1 WHERE id = ?2",
                params![hint, session_id],
            )?;
        }

        tx.commit()?;

        Ok(AppendOutcome {
            saved_count: survivors.len(),
            total_count,
        })
    }

    /// Read a session's messages in ascending order.
    ///
    /// Applies the same signature-based deduplication defensively at read
    /// time, in case a dual-write race ever slipped two equal rows in.
    pub fn read_messages(
        &self,
        session_id: &str,
        requester_id: &str,
    ) -> Result<Vec<Message>, WayfarerError> {
        // Ownership gate before any message data is touched
        self.get_session(session_id, requester_id)?;

        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, role, content, timestamp, seq
             FROM messages WHERE session_id = ?1
             ORDER BY timestamp, seq",
        )?;

        let rows = stmt.query_map(params![session_id], |row| {
            let role: String = row.get(2)?;
            let ts: String = row.get(4)?;
            Ok(Message {
                id: row.get(0)?,
                session_id: row.get(1)?,
                role: Role::normalize(&role),
                content: row.get(3)?,
                timestamp: decode_ts(4, &ts)?,
                seq: row.get(5)?,
            })
        })?;

        let mut seen: HashSet<Signature> = HashSet::new();
        let mut result = Vec::new();
        for row in rows {
            let message = row?;
            if seen.insert(Signature::of(&message)) {
                result.push(message);
            }
        }
        Ok(result)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Timestamps are stored as fixed-width RFC3339 UTC with millisecond
/// precision, so lexicographic order in SQL equals chronological order.
fn encode_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_ts(col: usize, s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let created: String = row.get(3)?;
    let updated: String = row.get(4)?;
    Ok(Session {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        created_at: decode_ts(3, &created)?,
        updated_at: decode_ts(4, &updated)?,
        message_count: row.get(5)?,
        last_message_preview: row.get(6)?,
    })
}
