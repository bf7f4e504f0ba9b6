//! Integration tests for the messaging data layer.
//!
//! Exercises the pooled database: WAL mode, cascades on user deletion,
//! history rows surviving their editor, and schema version tracking.

use chrono::Utc;
use pd_core::config::DatabaseConfig;
use pd_core::constants::DB_SCHEMA_VERSION;
use pd_models::{migrations, Conversation, Database, Message, MessageHistory, Notification, User};
use tempfile::TempDir;

fn create_test_db() -> (Database, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("test.db");
    let db = Database::init(&path, &DatabaseConfig::default()).expect("failed to init test database");
    (db, dir)
}

fn seed_pair(db: &Database) -> (User, User, Conversation) {
    let conn = db.conn().unwrap();
    let alice = User::new("alice", "alice@example.com", "h".into());
    let bob = User::new("bob", "bob@example.com", "h".into());
    alice.insert(&conn).unwrap();
    bob.insert(&conn).unwrap();
    let conv = Conversation::new();
    conv.insert(&conn).unwrap();
    conv.add_participant(&conn, &alice.user_id).unwrap();
    conv.add_participant(&conn, &bob.user_id).unwrap();
    (alice, bob, conv)
}

// ---- Database initialization ----

#[test]
fn database_init_creates_file_and_wal_mode() {
    let (db, dir) = create_test_db();
    assert!(dir.path().join("test.db").exists());

    let conn = db.conn().unwrap();
    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");
}

#[test]
fn database_init_records_schema_version() {
    let (db, _dir) = create_test_db();
    let conn = db.conn().unwrap();
    assert_eq!(migrations::get_schema_version(&conn).unwrap(), DB_SCHEMA_VERSION);
}

#[test]
fn reopening_existing_database_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("persist.db");
    {
        let db = Database::init(&path, &DatabaseConfig::default()).unwrap();
        seed_pair(&db);
    }
    let db = Database::init(&path, &DatabaseConfig::default()).unwrap();
    assert_eq!(db.stats().unwrap().users, 2);
}

// ---- Cascades ----

#[test]
fn deleting_user_cascades_messages_and_notifications() {
    let (db, _dir) = create_test_db();
    let (alice, bob, conv) = seed_pair(&db);
    let conn = db.conn().unwrap();

    let msg = Message::new(conv.conversation_id, alice.user_id, "hi").with_receiver(Some(bob.user_id));
    msg.insert(&conn).unwrap();
    Notification::new(bob.user_id, msg.message_id).insert(&conn).unwrap();

    assert!(User::delete(&conn, &alice.user_id).unwrap());

    let stats = db.stats().unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.messages, 0);
    assert_eq!(stats.notifications, 0);
    assert_eq!(Conversation::participants(&conn, &conv.conversation_id).unwrap().len(), 1);
}

#[test]
fn history_keeps_rows_with_null_editor_after_user_deletion() {
    let (db, _dir) = create_test_db();
    let (alice, bob, conv) = seed_pair(&db);
    let conn = db.conn().unwrap();

    let msg = Message::new(conv.conversation_id, alice.user_id, "v1");
    msg.insert(&conn).unwrap();
    MessageHistory::new(msg.message_id, "v0", Some(bob.user_id), Utc::now())
        .insert(&conn)
        .unwrap();

    User::delete(&conn, &bob.user_id).unwrap();

    let history = MessageHistory::list_for_message(&conn, &msg.message_id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].old_content, "v0");
    assert!(history[0].edited_by.is_none());
}

#[test]
fn deleting_parent_message_removes_replies() {
    let (db, _dir) = create_test_db();
    let (alice, bob, conv) = seed_pair(&db);
    let conn = db.conn().unwrap();

    let root = Message::new(conv.conversation_id, alice.user_id, "root");
    root.insert(&conn).unwrap();
    Message::new(conv.conversation_id, bob.user_id, "reply")
        .with_parent(Some(root.message_id))
        .insert(&conn)
        .unwrap();

    Message::delete(&conn, &root.message_id).unwrap();
    assert_eq!(db.stats().unwrap().messages, 0);
}

// ---- Notifications ----

#[test]
fn notifications_list_unread_first() {
    let (db, _dir) = create_test_db();
    let (alice, bob, conv) = seed_pair(&db);
    let conn = db.conn().unwrap();

    let m1 = Message::new(conv.conversation_id, alice.user_id, "one");
    m1.insert(&conn).unwrap();
    let m2 = Message::new(conv.conversation_id, alice.user_id, "two");
    m2.insert(&conn).unwrap();

    let first_id = Notification::new(bob.user_id, m1.message_id).insert(&conn).unwrap();
    Notification::new(bob.user_id, m2.message_id).insert(&conn).unwrap();
    Notification::mark_read(&conn, first_id).unwrap();

    assert_eq!(Notification::count_unread(&conn, &bob.user_id).unwrap(), 1);
    let listed = Notification::list_for_user(&conn, &bob.user_id, true).unwrap();
    assert!(!listed[0].is_read);
    assert!(listed[1].is_read);
}
