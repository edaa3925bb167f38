//! Message record types shared by the store, scanner, and API.

use serde::{Deserialize, Serialize};

/// A message ready to be stored, decoupled from its source - any
/// ingestion path can produce this.
///
/// `message_id` is the message's own declared identity; when absent the
/// store synthesizes a placeholder so the uniqueness constraint still
/// holds. All other optional fields are stored as-is.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub message_id: Option<String>,
    pub user: String,
    pub folder: String,
    pub filename: String,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<i64>,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// A stored message row, as served to the viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    pub message_id: String,
    pub user: String,
    pub folder: String,
    pub filename: String,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    pub timestamp: Option<i64>,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Outcome of an insert: either a fresh row or the id of the row that
/// already holds this message identity (dedup is a no-op, not an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    AlreadyPresent(i64),
}

impl InsertOutcome {
    pub fn id(&self) -> i64 {
        match self {
            InsertOutcome::Inserted(id) | InsertOutcome::AlreadyPresent(id) => *id,
        }
    }
}

/// Filter, search, and pagination parameters for the query engine.
///
/// `page` is 1-indexed and `limit` must be within [1, 100]; the store
/// rejects out-of-range values rather than clamping them.
#[derive(Debug, Clone)]
pub struct MessageQuery {
    pub user: Option<String>,
    pub folder: Option<String>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
}

/// One page of query results plus the pagination envelope.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePage {
    pub data: Vec<StoredMessage>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}
