// tests/store_test.rs — Integration test: SQLite round-trip (ledger CRUD + dedup)

use wayfarer::ledger::store::Store;
use wayfarer::ledger::{LedgerManager, MessageDraft, Role};

/// Create an in-memory SQLite ledger with schema applied.
fn test_store() -> Store {
    LedgerManager::in_memory().unwrap().store
}

const OWNER: &str = "u-owner";

#[test]
fn test_create_session_defaults() {
    let store = test_store();

    let session = store.create_session(OWNER, None).unwrap();
    assert_eq!(session.title, "New Trip Plan");
    assert_eq!(session.message_count, 0);
    assert!(session.last_message_preview.is_none());

    let fetched = store.get_session(&session.id, OWNER).unwrap();
    assert_eq!(fetched.id, session.id);
    assert_eq!(fetched.message_count, 0);
}

#[test]
fn test_create_session_blank_title_gets_placeholder() {
    let store = test_store();
    let session = store.create_session(OWNER, Some("   ")).unwrap();
    assert_eq!(session.title, "New Trip Plan");
}

#[test]
fn test_get_session_wrong_owner_is_not_found() {
    let store = test_store();
    let session = store.create_session(OWNER, Some("Tokyo")).unwrap();

    let err = store.get_session(&session.id, "u-other").unwrap_err();
    // Not-owned and absent answer identically
    assert_eq!(err.to_string(), "Session not found");
    let err = store.get_session("no-such-id", OWNER).unwrap_err();
    assert_eq!(err.to_string(), "Session not found");
}

#[test]
fn test_append_and_read_round_trip() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let outcome = store
        .append_messages(
            &session.id,
            OWNER,
            &[
                MessageDraft::user("I want to plan a trip to Japan"),
                MessageDraft::assistant("Great! When are you traveling?"),
            ],
            None,
        )
        .unwrap();

    assert_eq!(outcome.saved_count, 2);
    assert_eq!(outcome.total_count, 2);

    let messages = store.read_messages(&session.id, OWNER).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "I want to plan a trip to Japan");
    assert_eq!(messages[1].role, Role::Assistant);
}

#[test]
fn test_double_append_is_idempotent() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let batch = [
        MessageDraft::user("Planning a trip to Peru"),
        MessageDraft::assistant("Lima or Cusco first?"),
    ];

    let first = store
        .append_messages(&session.id, OWNER, &batch, None)
        .unwrap();
    assert_eq!(first.saved_count, 2);
    assert_eq!(first.total_count, 2);

    // Redelivering the identical batch stores nothing new
    let second = store
        .append_messages(&session.id, OWNER, &batch, None)
        .unwrap();
    assert_eq!(second.saved_count, 0);
    assert_eq!(second.total_count, 2);
}

#[test]
fn test_dedup_is_case_sensitive_and_trim_only() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    store
        .append_messages(&session.id, OWNER, &[MessageDraft::user("Paris trip")], None)
        .unwrap();

    // Same content modulo surrounding whitespace: duplicate
    let outcome = store
        .append_messages(
            &session.id,
            OWNER,
            &[MessageDraft::user("  Paris trip  ")],
            None,
        )
        .unwrap();
    assert_eq!(outcome.saved_count, 0);

    // Different casing: a distinct signature, stored
    let outcome = store
        .append_messages(&session.id, OWNER, &[MessageDraft::user("Paris Trip")], None)
        .unwrap();
    assert_eq!(outcome.saved_count, 1);
    assert_eq!(outcome.total_count, 2);
}

#[test]
fn test_intra_batch_duplicates_first_occurrence_wins() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let outcome = store
        .append_messages(
            &session.id,
            OWNER,
            &[
                MessageDraft::user("hello"),
                MessageDraft::user("hello"),
                MessageDraft::assistant("hello"),
            ],
            None,
        )
        .unwrap();

    // Same role+content twice in one batch collapses to one; the
    // assistant's identical text is a different signature
    assert_eq!(outcome.saved_count, 2);

    let messages = store.read_messages(&session.id, OWNER).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
}

#[test]
fn test_ordering_across_batches() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    store
        .append_messages(
            &session.id,
            OWNER,
            &[MessageDraft::user("one"), MessageDraft::assistant("two")],
            None,
        )
        .unwrap();
    store
        .append_messages(
            &session.id,
            OWNER,
            &[MessageDraft::user("three"), MessageDraft::assistant("four")],
            None,
        )
        .unwrap();

    let messages = store.read_messages(&session.id, OWNER).unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three", "four"]);

    // Timestamps never decrease, and the seq counter strictly increases
    for pair in messages.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
        assert!(pair[0].seq < pair[1].seq);
    }
}

#[test]
fn test_content_is_trimmed_on_store() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    store
        .append_messages(
            &session.id,
            OWNER,
            &[MessageDraft::user("  padded content  ")],
            None,
        )
        .unwrap();

    let messages = store.read_messages(&session.id, OWNER).unwrap();
    assert_eq!(messages[0].content, "padded content");
}

#[test]
fn test_empty_batch_rejected_without_side_effects() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let err = store
        .append_messages(&session.id, OWNER, &[], Some("Sneaky title"))
        .unwrap_err();
    assert!(err.to_string().contains("Invalid input"));

    // Nothing changed: no messages, title untouched
    let fetched = store.get_session(&session.id, OWNER).unwrap();
    assert_eq!(fetched.message_count, 0);
    assert_eq!(fetched.title, "New Trip Plan");
}

#[test]
fn test_append_to_foreign_session_is_not_found() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let err = store
        .append_messages(
            &session.id,
            "u-other",
            &[MessageDraft::user("mine now")],
            None,
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Session not found");

    assert_eq!(store.get_session(&session.id, OWNER).unwrap().message_count, 0);
}

#[test]
fn test_metadata_recomputed_on_append() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    store
        .append_messages(
            &session.id,
            OWNER,
            &[
                MessageDraft::user("first"),
                MessageDraft::assistant("the newest message"),
            ],
            None,
        )
        .unwrap();

    let fetched = store.get_session(&session.id, OWNER).unwrap();
    assert_eq!(fetched.message_count, 2);
    assert_eq!(
        fetched.last_message_preview.as_deref(),
        Some("the newest message")
    );
    assert!(fetched.updated_at >= fetched.created_at);
}

#[test]
fn test_preview_truncated_to_100_chars() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let long = "x".repeat(150);
    store
        .append_messages(&session.id, OWNER, &[MessageDraft::assistant(&long)], None)
        .unwrap();

    let fetched = store.get_session(&session.id, OWNER).unwrap();
    let preview = fetched.last_message_preview.unwrap();
    assert_eq!(preview.chars().count(), 100);
}

#[test]
fn test_title_hint_applied_and_blank_hint_ignored() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    store
        .append_messages(
            &session.id,
            OWNER,
            &[MessageDraft::user("hi")],
            Some("Trip to Japan"),
        )
        .unwrap();
    assert_eq!(
        store.get_session(&session.id, OWNER).unwrap().title,
        "Trip to Japan"
    );

    // A blank hint leaves the title alone
    store
        .append_messages(&session.id, OWNER, &[MessageDraft::user("more")], Some("  "))
        .unwrap();
    assert_eq!(
        store.get_session(&session.id, OWNER).unwrap().title,
        "Trip to Japan"
    );
}

#[test]
fn test_list_sessions_sorted_by_updated_at_desc() {
    let store = test_store();
    let older = store.create_session(OWNER, Some("Older")).unwrap();
    let newer = store.create_session(OWNER, Some("Newer")).unwrap();

    // Backdate the first session via raw SQL to force a stable order
    store
        .conn()
        .execute(
            "UPDATE sessions SET updated_at = '2020-01-01T00:00:00.000Z' WHERE id = ?1",
            [&older.id],
        )
        .unwrap();

    let sessions = store.list_sessions(OWNER).unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].id, newer.id);
    assert_eq!(sessions[1].id, older.id);

    // Appending to the stale session bumps it back to the front
    store
        .append_messages(&older.id, OWNER, &[MessageDraft::user("revived")], None)
        .unwrap();
    let sessions = store.list_sessions(OWNER).unwrap();
    assert_eq!(sessions[0].id, older.id);
}

#[test]
fn test_list_sessions_isolated_per_owner() {
    let store = test_store();
    store.create_session(OWNER, None).unwrap();
    store.create_session("u-other", None).unwrap();

    assert_eq!(store.list_sessions(OWNER).unwrap().len(), 1);
    assert_eq!(store.list_sessions("u-other").unwrap().len(), 1);
    assert!(store.list_sessions("u-nobody").unwrap().is_empty());
}

#[test]
fn test_delete_session_cascades_to_messages() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();
    store
        .append_messages(
            &session.id,
            OWNER,
            &[MessageDraft::user("a"), MessageDraft::assistant("b")],
            None,
        )
        .unwrap();

    store.delete_session(&session.id, OWNER).unwrap();

    let err = store.get_session(&session.id, OWNER).unwrap_err();
    assert_eq!(err.to_string(), "Session not found");

    // No orphaned message rows remain
    let count: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM messages WHERE session_id = ?1",
            [&session.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_delete_session_wrong_owner_is_not_found() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();

    let err = store.delete_session(&session.id, "u-other").unwrap_err();
    assert_eq!(err.to_string(), "Session not found");

    // Still there for the real owner
    assert!(store.get_session(&session.id, OWNER).is_ok());
}

#[test]
fn test_read_deduplicates_defensively() {
    let store = test_store();
    let session = store.create_session(OWNER, None).unwrap();
    store
        .append_messages(&session.id, OWNER, &[MessageDraft::user("hello")], None)
        .unwrap();

    // Simulate a dual-write race by inserting an equal-signature row
    // behind the dedup's back
    store
        .conn()
        .execute(
            "INSERT INTO messages (id, session_id, role, content, timestamp, seq)
             VALUES ('rogue-1', ?1, 'user', 'hello', '2030-01-01T00:00:00.000Z', 99)",
            [&session.id],
        )
        .unwrap();

    let messages = store.read_messages(&session.id, OWNER).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hello");
}

#[test]
fn test_schema_migrations_idempotent() {
    // Running migrations twice should not fail
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    wayfarer::ledger::schema::run_migrations(&conn).unwrap();
    wayfarer::ledger::schema::run_migrations(&conn).unwrap();

    let count: i32 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='messages'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}
