use rusqlite::Connection;

use crate::types::error::Result;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Primary message store, one row per ingested file.
        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id      TEXT NOT NULL UNIQUE,   -- declared Message-ID, or synthesized placeholder
            user            TEXT NOT NULL,          -- first path segment under the scan root
            folder          TEXT NOT NULL,          -- remaining directory segments
            filename        TEXT NOT NULL,          -- path relative to the scan root
            from_address    TEXT,
            to_address      TEXT,
            subject         TEXT,
            date            TEXT,                   -- declared date, RFC 3339 when parseable
            timestamp       INTEGER,                -- epoch seconds, NULL when unparseable
            body_text       TEXT,
            body_html       TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user_folder ON messages(user, folder);
        CREATE INDEX IF NOT EXISTS idx_messages_timestamp   ON messages(timestamp DESC);
    ",
    )?;

    // FTS5 virtual table over the searchable fields, external content
    // pointing at messages. Kept in sync by an explicit write-through
    // step inside insert/clear, not by engine triggers. Created outside
    // the batch above (virtual tables cannot share it).
    conn.execute_batch(
        "
        CREATE VIRTUAL TABLE IF NOT EXISTS message_search USING fts5(
            message_id,
            user,
            folder,
            from_address,
            to_address,
            subject,
            body_text,
            content='messages',
            content_rowid='id',
            tokenize='unicode61 remove_diacritics 1'
        );
    ",
    )?;

    Ok(())
}
