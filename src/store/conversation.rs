//! Conversation history and alert records

use chrono::Utc;
use uuid::Uuid;

use crate::Result;

use super::SqliteStore;

/// One stored exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    pub input: String,
    pub response: String,
    pub created_at: String,
}

impl SqliteStore {
    pub(crate) fn insert_conversation(
        &self,
        user_id: &str,
        input: &str,
        response: &str,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO conversations (user_id, input, response, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, input, response, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    /// Most recent exchanges for a user, newest first
    ///
    /// # Errors
    ///
    /// Returns error if the query fails
    pub fn recent_conversations(&self, user_id: &str, limit: u32) -> Result<Vec<Exchange>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT input, response, created_at FROM conversations
             WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(rusqlite::params![user_id, limit], |row| {
            Ok(Exchange {
                input: row.get(0)?,
                response: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut exchanges = Vec::new();
        for row in rows {
            exchanges.push(row?);
        }

        Ok(exchanges)
    }

    pub(crate) fn insert_alert(
        &self,
        user_id: &str,
        contacts: &[String],
        location: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        let contacts_json = serde_json::to_string(contacts)?;

        conn.execute(
            "INSERT INTO alerts (id, user_id, contacts, location, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                user_id,
                contacts_json,
                location,
                Utc::now().to_rfc3339()
            ],
        )?;

        tracing::warn!(user_id = %user_id, contacts = contacts.len(), "emergency alert recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_history_ordering() {
        let store = SqliteStore::init_memory().unwrap();
        store.ensure_user("user-1").unwrap();

        store
            .insert_conversation("user-1", "describe the scene", "A quiet room.")
            .unwrap();
        store
            .insert_conversation("user-1", "read the text", "It says EXIT.")
            .unwrap();

        let history = store.recent_conversations("user-1", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].input, "read the text");
    }

    #[test]
    fn test_conversation_limit() {
        let store = SqliteStore::init_memory().unwrap();
        store.ensure_user("user-1").unwrap();

        for i in 0..5 {
            store
                .insert_conversation("user-1", &format!("command {i}"), "ok")
                .unwrap();
        }

        assert_eq!(store.recent_conversations("user-1", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_alert_recorded_without_location() {
        let store = SqliteStore::init_memory().unwrap();
        store.ensure_user("user-1").unwrap();

        store
            .insert_alert("user-1", &["+15550100".to_string()], None)
            .unwrap();

        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
