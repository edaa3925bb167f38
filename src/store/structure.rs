//! Distinct (user, folder) structure for navigation.

use indexmap::IndexMap;

use super::MessageStore;
use crate::types::error::Result;

impl MessageStore {
    /// Map every stored user to their folders, users then folders
    /// ordered case-insensitively. Entries differing only by case are
    /// merged; the first-seen casing wins.
    pub fn get_distinct_user_folders(&self) -> Result<IndexMap<String, Vec<String>>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT user, folder FROM messages
             ORDER BY user COLLATE NOCASE, folder COLLATE NOCASE",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut structure: IndexMap<String, Vec<String>> = IndexMap::new();
        for row in rows {
            let (user, folder) = row?;
            let key = structure
                .keys()
                .find(|existing| existing.eq_ignore_ascii_case(&user))
                .cloned()
                .unwrap_or(user);
            let folders = structure.entry(key).or_default();
            if !folders.iter().any(|f| f.eq_ignore_ascii_case(&folder)) {
                folders.push(folder);
            }
        }

        Ok(structure)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sample_message;
    use super::*;

    #[test]
    fn test_structure_groups_folders_by_user() {
        let store = MessageStore::in_memory().unwrap();
        store.insert(&sample_message("m1", "bob", "sent")).unwrap();
        store.insert(&sample_message("m2", "alice", "inbox")).unwrap();
        store.insert(&sample_message("m3", "alice", "archive")).unwrap();
        store.insert(&sample_message("m4", "alice", "inbox")).unwrap();

        let structure = store.get_distinct_user_folders().unwrap();

        let users: Vec<&String> = structure.keys().collect();
        assert_eq!(users, vec!["alice", "bob"]);
        assert_eq!(structure["alice"], vec!["archive", "inbox"]);
        assert_eq!(structure["bob"], vec!["sent"]);
    }

    #[test]
    fn test_structure_dedups_case_variants() {
        let store = MessageStore::in_memory().unwrap();
        store.insert(&sample_message("m1", "Alice", "Inbox")).unwrap();
        store.insert(&sample_message("m2", "alice", "inbox")).unwrap();

        let structure = store.get_distinct_user_folders().unwrap();
        assert_eq!(structure.len(), 1);
        let folders = structure.values().next().unwrap();
        assert_eq!(folders.len(), 1);
    }

    #[test]
    fn test_structure_empty_store() {
        let store = MessageStore::in_memory().unwrap();
        assert!(store.get_distinct_user_folders().unwrap().is_empty());
    }
}
