//! Scan orchestration: walker -> parser -> store for a full batch
//! ingestion, aggregating counts and per-file skips.
//!
//! One bad file never aborts a scan; it is recorded and the scan moves
//! on. A store failure does abort; there is no point continuing
//! against a broken database. Re-running a scan is safe: the store
//! dedups on message identity.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::parser::parse_message;
use crate::store::MessageStore;
use crate::types::error::Result;
use crate::types::message::NewMessage;
use crate::walker::walk_root;

/// Aggregated results of one scan.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub scanned_count: u64,
    pub indexed_count: u64,
    pub skipped_count: u64,
    pub errors: Vec<ScanSkip>,
}

/// One skipped file and why. Every skip leaves a trace; files are never
/// dropped silently.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSkip {
    pub file: String,
    pub reason: String,
}

impl ScanStats {
    fn skip(&mut self, file: String, reason: String) {
        self.skipped_count += 1;
        self.errors.push(ScanSkip { file, reason });
    }
}

/// Scan `root`, ingesting every discovered message file into `store`.
///
/// Cancellation is cooperative: when `cancel` is raised the scan stops
/// before processing the next file and returns the totals so far.
/// Callers are expected to serialize scans: single writer.
pub fn scan(store: &MessageStore, root: &Path, cancel: &AtomicBool) -> Result<ScanStats> {
    info!("Starting scan of {:?}", root);
    let mut stats = ScanStats::default();

    for entry in walk_root(root)? {
        if cancel.load(Ordering::SeqCst) {
            info!(
                scanned = stats.scanned_count,
                "Scan cancelled, stopping before next file"
            );
            break;
        }

        stats.scanned_count += 1;

        let file = match entry {
            Ok(file) => file,
            Err(err) => {
                warn!("Unwalkable entry: {}", err);
                stats.skip("<traversal>".to_string(), err.to_string());
                continue;
            }
        };

        let raw = match fs::read(&file.path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(file = %file.filename, "Unreadable file: {}", err);
                stats.skip(file.filename, err.to_string());
                continue;
            }
        };

        let parsed = match parse_message(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(file = %file.filename, "Skipping unparseable file: {}", err);
                stats.skip(file.filename, err.to_string());
                continue;
            }
        };

        let msg = NewMessage {
            message_id: parsed.message_id,
            user: file.user,
            folder: file.folder,
            filename: file.filename,
            from_address: parsed.from_address,
            to_address: parsed.to_address,
            subject: parsed.subject,
            date: parsed.date,
            timestamp: parsed.timestamp,
            body_text: parsed.body_text,
            body_html: parsed.body_html,
        };

        // Duplicates are an idempotent no-op and still count as
        // indexed; a store error aborts the whole scan.
        store.insert(&msg)?;
        stats.indexed_count += 1;
    }

    info!(
        scanned = stats.scanned_count,
        indexed = stats.indexed_count,
        skipped = stats.skipped_count,
        "Scan finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::error::ShelfError;
    use crate::types::message::MessageQuery;
    use std::path::PathBuf;

    fn write_file(path: &PathBuf, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn message_bytes(id: &str, subject: &str) -> Vec<u8> {
        format!(
            "Message-ID: <{}>\r\nFrom: a@example.com\r\nSubject: {}\r\n\
             Date: Mon, 14 Feb 2000 10:00:00 -0800\r\n\r\nbody text\r\n",
            id, subject
        )
        .into_bytes()
    }

    fn total(store: &MessageStore) -> u64 {
        store
            .query(&MessageQuery {
                user: None,
                folder: None,
                search: None,
                page: 1,
                limit: 100,
            })
            .unwrap()
            .pagination
            .total
    }

    #[test]
    fn test_scan_counts_and_structure() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_file(&root.join("alice/inbox/1."), &message_bytes("a1", "one"));
        write_file(&root.join("alice/inbox/2."), b"not a message at all\nno headers here\n");
        write_file(&root.join("bob/sent/1."), &message_bytes("b1", "two"));

        let store = MessageStore::in_memory().unwrap();
        let cancel = AtomicBool::new(false);
        let stats = scan(&store, root, &cancel).unwrap();

        assert_eq!(stats.scanned_count, 3);
        assert_eq!(stats.indexed_count, 2);
        assert_eq!(stats.skipped_count, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(stats.errors[0].file.contains("alice/inbox/2."));

        let structure = store.get_distinct_user_folders().unwrap();
        let users: Vec<&String> = structure.keys().collect();
        assert_eq!(users, vec!["alice", "bob"]);
        assert_eq!(structure["alice"], vec!["inbox"]);
        assert_eq!(structure["bob"], vec!["sent"]);
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_file(&root.join("alice/inbox/1."), &message_bytes("a1", "one"));
        write_file(&root.join("alice/inbox/2."), &message_bytes("a2", "two"));

        let store = MessageStore::in_memory().unwrap();
        let cancel = AtomicBool::new(false);

        scan(&store, root, &cancel).unwrap();
        let after_first = total(&store);

        let stats = scan(&store, root, &cancel).unwrap();
        assert_eq!(stats.indexed_count, 2);
        assert_eq!(total(&store), after_first);
    }

    #[test]
    fn test_cancelled_scan_processes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_file(&root.join("alice/inbox/1."), &message_bytes("a1", "one"));

        let store = MessageStore::in_memory().unwrap();
        let cancel = AtomicBool::new(true);
        let stats = scan(&store, root, &cancel).unwrap();

        assert_eq!(stats.scanned_count, 0);
        assert_eq!(total(&store), 0);
    }

    #[test]
    fn test_invalid_root_aborts() {
        let store = MessageStore::in_memory().unwrap();
        let cancel = AtomicBool::new(false);
        let err = scan(&store, Path::new("/definitely/not/here"), &cancel)
            .expect_err("Bad root should abort the scan");
        assert!(matches!(err, ShelfError::InvalidRoot(_)));
    }
}
