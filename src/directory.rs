//! Folder directory: the distinct user/folder tree for navigation.
//! Purely derived from the store, no state of its own.

use indexmap::IndexMap;

use crate::store::MessageStore;
use crate::types::error::Result;

pub fn list_structure(store: &MessageStore) -> Result<IndexMap<String, Vec<String>>> {
    store.get_distinct_user_folders()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::NewMessage;

    #[test]
    fn test_list_structure_delegates_to_store() {
        let store = MessageStore::in_memory().unwrap();
        store
            .insert(&NewMessage {
                message_id: Some("m1".to_string()),
                user: "alice".to_string(),
                folder: "inbox".to_string(),
                filename: "alice/inbox/1.".to_string(),
                from_address: None,
                to_address: None,
                subject: None,
                date: None,
                timestamp: None,
                body_text: None,
                body_html: None,
            })
            .unwrap();

        let structure = list_structure(&store).unwrap();
        assert_eq!(structure["alice"], vec!["inbox"]);
    }
}
