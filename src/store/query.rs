//! Query engine: combined filter / full-text search / pagination over
//! the message store, with stable ordering.

use rusqlite::ToSql;

use super::MessageStore;
use crate::types::error::{Result, ShelfError};
use crate::types::message::{MessagePage, MessageQuery, Pagination, StoredMessage};

impl MessageStore {
    /// Run a combined filter/search/paginate query.
    ///
    /// Equality filters and the full-text match are ANDed. Results are
    /// ordered by timestamp descending (messages without a parseable
    /// date sort as oldest), ties broken by id descending. `total` and
    /// `pages` reflect the filtered set, not the whole store.
    pub fn query(&self, query: &MessageQuery) -> Result<MessagePage> {
        if query.page < 1 {
            return Err(ShelfError::Validation("Invalid page number".to_string()));
        }
        if query.limit < 1 || query.limit > 100 {
            return Err(ShelfError::Validation(
                "Invalid limit number (must be 1-100)".to_string(),
            ));
        }

        let mut joins = String::new();
        let mut where_clauses: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(match_expr) = query
            .search
            .as_deref()
            .and_then(build_match_query)
        {
            joins.push_str(" JOIN message_search s ON s.rowid = messages.id");
            where_clauses.push("s.message_search MATCH ?");
            params.push(Box::new(match_expr));
        }
        if let Some(user) = &query.user {
            where_clauses.push("messages.user = ?");
            params.push(Box::new(user.clone()));
        }
        if let Some(folder) = &query.folder {
            where_clauses.push("messages.folder = ?");
            params.push(Box::new(folder.clone()));
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", where_clauses.join(" AND "))
        };

        let conn = self.connection()?;

        let count_sql = format!(
            "SELECT COUNT(messages.id) FROM messages{}{}",
            joins, where_sql
        );
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(&count_sql, param_refs.as_slice(), |row| row.get(0))?;

        let items_sql = format!(
            "SELECT messages.id, messages.message_id, messages.user, messages.folder,
                    messages.filename, messages.from_address, messages.to_address,
                    messages.subject, messages.date, messages.timestamp,
                    messages.body_text, messages.body_html
             FROM messages{}{}
             ORDER BY messages.timestamp DESC, messages.id DESC
             LIMIT ? OFFSET ?",
            joins, where_sql
        );

        let offset = (query.page as i64 - 1) * query.limit as i64;
        params.push(Box::new(query.limit as i64));
        params.push(Box::new(offset));
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&items_sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), Self::row_to_message)?;

        let mut data: Vec<StoredMessage> = Vec::new();
        for row in rows {
            data.push(row?);
        }

        let total = total.max(0) as u64;
        let limit = query.limit as u64;
        Ok(MessagePage {
            data,
            pagination: Pagination {
                total,
                page: query.page,
                limit: query.limit,
                pages: total.div_ceil(limit),
            },
        })
    }
}

/// Build an FTS5 MATCH expression from free-form user input: each
/// whitespace-separated term is reduced to `[A-Za-z0-9_-]`, quoted, and
/// prefix-matched; terms are ANDed. Returns None when nothing usable
/// remains (blank search means "no text filter", not "match nothing").
fn build_match_query(raw: &str) -> Option<String> {
    let terms: Vec<String> = raw
        .split_whitespace()
        .map(|term| {
            term.chars()
                .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-')
                .collect::<String>()
        })
        .filter(|term| term.chars().any(|ch| ch.is_ascii_alphanumeric()))
        .map(|term| format!("\"{}\"*", term))
        .collect();

    if terms.is_empty() {
        return None;
    }

    Some(terms.join(" AND "))
}
