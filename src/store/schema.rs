//! Database schema

use rusqlite::Connection;

use crate::Result;

/// Create all tables if they do not exist
///
/// # Errors
///
/// Returns error if any DDL statement fails
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            preferences TEXT NOT NULL,
            emergency_contacts TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS conversations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id),
            input TEXT NOT NULL,
            response TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user
            ON conversations(user_id, created_at);

        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            contacts TEXT NOT NULL,
            location TEXT,
            created_at TEXT NOT NULL
        );",
    )?;

    Ok(())
}
