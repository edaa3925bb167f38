//! SQLite-backed message store with a synchronized full-text index.
//!
//! The store is an explicitly constructed value with an `open`/
//! `in_memory` lifecycle, injected into whatever needs it; dropping the
//! last clone closes the pool. Every mutation pairs the primary row
//! with its search-index projection inside one transaction, so readers
//! never observe a message without its index entry or vice versa.

mod pool;
mod query;
mod schema;
mod structure;

use std::path::Path;

use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

pub use pool::{DbConnection, DbPool};

use crate::types::error::{Result, ShelfError};
use crate::types::message::{InsertOutcome, NewMessage, StoredMessage};

/// Durable keyed storage plus synchronized search index.
#[derive(Clone)]
pub struct MessageStore {
    pool: DbPool,
}

impl MessageStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pool = pool::create_pool(path.as_ref())?;
        let store = Self { pool };
        store.initialize()?;
        info!("Message store opened at {:?}", path.as_ref());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = pool::create_memory_pool()?;
        let store = Self { pool };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        schema::initialize_schema(&conn)
    }

    pub(crate) fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .map_err(|e| ShelfError::Store(format!("Failed to get database connection: {}", e)))
    }

    /// Insert a message, deduplicating on message identity.
    ///
    /// A duplicate identity is a no-op returning the existing row's id,
    /// never an error. The row and its search projection are written in
    /// the same transaction.
    pub fn insert(&self, msg: &NewMessage) -> Result<InsertOutcome> {
        // Storage-level uniqueness must hold even for messages that
        // declare no identity of their own.
        let identity = msg
            .message_id
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("missing-{}", Uuid::new_v4()));

        let conn = self.connection()?;
        let tx = conn.unchecked_transaction()?;

        let affected = tx.execute(
            "INSERT OR IGNORE INTO messages (
                message_id, user, folder, filename, from_address,
                to_address, subject, date, timestamp, body_text, body_html
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                identity,
                msg.user,
                msg.folder,
                msg.filename,
                msg.from_address,
                msg.to_address,
                msg.subject,
                msg.date,
                msg.timestamp,
                msg.body_text,
                msg.body_html,
            ],
        )?;

        if affected == 0 {
            let existing: i64 = tx.query_row(
                "SELECT id FROM messages WHERE message_id = ?1",
                params![identity],
                |row| row.get(0),
            )?;
            tx.commit()?;
            debug!(message_id = %identity, existing, "Duplicate message identity, skipping insert");
            return Ok(InsertOutcome::AlreadyPresent(existing));
        }

        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO message_search (
                rowid, message_id, user, folder, from_address, to_address, subject, body_text
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                identity,
                msg.user,
                msg.folder,
                msg.from_address,
                msg.to_address,
                msg.subject,
                msg.body_text,
            ],
        )?;
        tx.commit()?;

        Ok(InsertOutcome::Inserted(id))
    }

    /// Remove all messages and their index entries in one transaction.
    pub fn clear(&self) -> Result<()> {
        let conn = self.connection()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM messages", [])?;
        tx.execute(
            "INSERT INTO message_search(message_search) VALUES('delete-all')",
            [],
        )?;
        tx.commit()?;
        info!("Message store cleared");
        Ok(())
    }

    /// Look up a message by its store-assigned id.
    pub fn get_by_id(&self, id: i64) -> Result<Option<StoredMessage>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, message_id, user, folder, filename, from_address,
                    to_address, subject, date, timestamp, body_text, body_html
             FROM messages WHERE id = ?1",
        )?;

        let result = stmt
            .query_row(params![id], Self::row_to_message)
            .optional()?;

        Ok(result)
    }

    fn row_to_message(row: &Row) -> rusqlite::Result<StoredMessage> {
        Ok(StoredMessage {
            id: row.get(0)?,
            message_id: row.get(1)?,
            user: row.get(2)?,
            folder: row.get(3)?,
            filename: row.get(4)?,
            from_address: row.get(5)?,
            to_address: row.get(6)?,
            subject: row.get(7)?,
            date: row.get(8)?,
            timestamp: row.get(9)?,
            body_text: row.get(10)?,
            body_html: row.get(11)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::types::message::NewMessage;

    /// Minimal message for store tests; override fields as needed.
    pub fn sample_message(identity: &str, user: &str, folder: &str) -> NewMessage {
        NewMessage {
            message_id: Some(identity.to_string()),
            user: user.to_string(),
            folder: folder.to_string(),
            filename: format!("{}/{}/1.", user, folder),
            from_address: Some("sender@example.com".to_string()),
            to_address: Some("recipient@example.com".to_string()),
            subject: Some("Subject".to_string()),
            date: None,
            timestamp: None,
            body_text: Some("body".to_string()),
            body_html: None,
        }
    }
}
