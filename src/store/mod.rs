//! Storage collaborator
//!
//! User preferences, conversation history and alert records over SQLite.
//! The orchestration core consumes the [`Store`] trait; [`SqliteStore`] is
//! the production implementation over a connection pool.

pub mod conversation;
pub mod preferences;
pub mod schema;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::state::Preferences;
use crate::{Error, Result};

/// Contract for the storage collaborator
pub trait Store: Send + Sync {
    /// Load a user's preferences, falling back to defaults for a new user
    ///
    /// # Errors
    ///
    /// Returns error if the query fails
    fn load_preferences(&self, user_id: &str) -> Result<Preferences>;

    /// Persist a user's preferences
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    fn save_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<()>;

    /// A user's emergency contacts, possibly empty
    ///
    /// # Errors
    ///
    /// Returns error if the query fails
    fn emergency_contacts(&self, user_id: &str) -> Result<Vec<String>>;

    /// Append one command/response exchange to the history
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    fn append_conversation(&self, user_id: &str, input: &str, response: &str) -> Result<()>;

    /// Record an emergency alert
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    fn record_alert(&self, user_id: &str, contacts: &[String], location: Option<&str>)
        -> Result<()>;

    /// Close the store; idempotent, subsequent operations fail
    fn close(&self);
}

/// SQLite-backed store over an r2d2 connection pool
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
    closed: AtomicBool,
}

impl SqliteStore {
    /// Open or create the database at the given path
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or migrated
    pub fn init(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::new(manager).map_err(|e| Error::Database(e.to_string()))?;

        let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
        schema::create_tables(&conn)?;
        drop(conn);

        tracing::info!(path = %path.display(), "database ready");

        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    /// In-memory database for tests
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be created
    pub fn init_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| Error::Database(e.to_string()))?;

        let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
        schema::create_tables(&conn)?;
        drop(conn);

        Ok(Self {
            pool,
            closed: AtomicBool::new(false),
        })
    }

    /// Get a pooled connection, failing once the store is closed
    pub(crate) fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Database("store is closed".to_string()));
        }

        self.pool.get().map_err(|e| Error::Database(e.to_string()))
    }
}

impl Store for SqliteStore {
    fn load_preferences(&self, user_id: &str) -> Result<Preferences> {
        self.get_preferences(user_id)
    }

    fn save_preferences(&self, user_id: &str, preferences: &Preferences) -> Result<()> {
        self.put_preferences(user_id, preferences)
    }

    fn emergency_contacts(&self, user_id: &str) -> Result<Vec<String>> {
        self.get_emergency_contacts(user_id)
    }

    fn append_conversation(&self, user_id: &str, input: &str, response: &str) -> Result<()> {
        self.insert_conversation(user_id, input, response)
    }

    fn record_alert(
        &self,
        user_id: &str,
        contacts: &[String],
        location: Option<&str>,
    ) -> Result<()> {
        self.insert_alert(user_id, contacts, location)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("store closed");
        }
    }
}
