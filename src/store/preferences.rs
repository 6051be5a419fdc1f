//! User rows: preferences and emergency contacts

use chrono::Utc;
use rusqlite::OptionalExtension;

use crate::state::Preferences;
use crate::{Error, Result};

use super::SqliteStore;

impl SqliteStore {
    /// Create the user row if it does not exist
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn ensure_user(&self, user_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let preferences = serde_json::to_string(&Preferences::default())?;

        conn.execute(
            "INSERT OR IGNORE INTO users (id, preferences, emergency_contacts, created_at)
             VALUES (?1, ?2, '[]', ?3)",
            rusqlite::params![user_id, preferences, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    pub(crate) fn get_preferences(&self, user_id: &str) -> Result<Preferences> {
        let conn = self.conn()?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT preferences FROM users WHERE id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Database(format!("corrupt preferences for {user_id}: {e}"))),
            None => Ok(Preferences::default()),
        }
    }

    pub(crate) fn put_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<()> {
        self.ensure_user(user_id)?;

        let conn = self.conn()?;
        let json = serde_json::to_string(preferences)?;
        conn.execute(
            "UPDATE users SET preferences = ?2 WHERE id = ?1",
            rusqlite::params![user_id, json],
        )?;

        Ok(())
    }

    pub(crate) fn get_emergency_contacts(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let raw: Option<String> = conn
            .query_row(
                "SELECT emergency_contacts FROM users WHERE id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::Database(format!("corrupt contacts for {user_id}: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    /// Replace a user's emergency contacts
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn set_emergency_contacts(&self, user_id: &str, contacts: &[String]) -> Result<()> {
        self.ensure_user(user_id)?;

        let conn = self.conn()?;
        let json = serde_json::to_string(contacts)?;
        conn.execute(
            "UPDATE users SET emergency_contacts = ?2 WHERE id = ?1",
            rusqlite::params![user_id, json],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DetailLevel;

    #[test]
    fn test_preferences_default_for_new_user() {
        let store = SqliteStore::init_memory().unwrap();
        let prefs = store.get_preferences("nobody").unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_preferences_roundtrip() {
        let store = SqliteStore::init_memory().unwrap();

        let prefs = Preferences {
            voice_speed: 1.5,
            detail_level: DetailLevel::Detailed,
            language: "de".to_string(),
            continuous_mode: true,
        };
        store.put_preferences("user-1", &prefs).unwrap();

        assert_eq!(store.get_preferences("user-1").unwrap(), prefs);
    }

    #[test]
    fn test_emergency_contacts_roundtrip() {
        let store = SqliteStore::init_memory().unwrap();

        assert!(store.get_emergency_contacts("user-1").unwrap().is_empty());

        let contacts = vec!["+15550100".to_string(), "+15550101".to_string()];
        store.set_emergency_contacts("user-1", &contacts).unwrap();

        assert_eq!(store.get_emergency_contacts("user-1").unwrap(), contacts);
    }

    #[test]
    fn test_ensure_user_preserves_existing_preferences() {
        let store = SqliteStore::init_memory().unwrap();

        let prefs = Preferences {
            voice_speed: 0.8,
            ..Preferences::default()
        };
        store.put_preferences("user-1", &prefs).unwrap();
        store.ensure_user("user-1").unwrap();

        assert_eq!(store.get_preferences("user-1").unwrap(), prefs);
    }
}
