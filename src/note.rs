//! Per-user free-text notes.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::{debug, info};

use crate::{BotError, ChatId, ItemKind, Result};

/// Represents the notes of every user, kept in creation order
#[derive(Debug, Clone, Default)]
pub struct NotesStore {
    notes: Arc<Mutex<HashMap<ChatId, Vec<String>>>>,
}

impl NotesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a note and returns its 1-based position
    pub fn create(&self, user: ChatId, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BotError::Validation {
                message: "note text is empty".to_string(),
            });
        }

        let mut notes = self.notes.lock().map_err(|_| BotError::poisoned("notes"))?;
        let list = notes.entry(user).or_default();
        list.push(text.to_string());

        debug!("Note #{} created for chat {}", list.len(), user);
        Ok(list.len())
    }

    pub fn list(&self, user: ChatId) -> Result<Vec<String>> {
        let notes = self.notes.lock().map_err(|_| BotError::poisoned("notes"))?;
        Ok(notes.get(&user).cloned().unwrap_or_default())
    }

    /// Removes the note at the 1-based `index`, dropping the user once no notes remain
    pub fn delete_at(&self, user: ChatId, index: usize) -> Result<String> {
        let mut notes = self.notes.lock().map_err(|_| BotError::poisoned("notes"))?;

        let list = match notes.get_mut(&user) {
            Some(list) if (1..=list.len()).contains(&index) => list,
            other => {
                return Err(BotError::NotFound {
                    kind: ItemKind::Note,
                    index,
                    available: other.map_or(0, |list| list.len()),
                });
            }
        };

        let removed = list.remove(index - 1);
        if list.is_empty() {
            notes.remove(&user);
        }

        info!("Note #{} deleted for chat {}", index, user);
        Ok(removed)
    }

    pub fn has_user(&self, user: ChatId) -> bool {
        self.notes
            .lock()
            .map(|notes| notes.contains_key(&user))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_list_delete_round_trip() {
        let store = NotesStore::new();
        let user = ChatId(7);

        assert_eq!(store.create(user, "x").unwrap(), 1);
        assert_eq!(store.list(user).unwrap(), vec!["x".to_string()]);

        assert_eq!(store.delete_at(user, 1).unwrap(), "x");
        assert!(store.list(user).unwrap().is_empty());
        assert!(!store.has_user(user));
    }

    #[test]
    fn delete_out_of_range_keeps_notes() {
        let store = NotesStore::new();
        let user = ChatId(7);
        store.create(user, "first").unwrap();

        assert!(matches!(
            store.delete_at(user, 0),
            Err(BotError::NotFound { kind: ItemKind::Note, available: 1, .. })
        ));
        assert!(matches!(
            store.delete_at(user, 2),
            Err(BotError::NotFound { .. })
        ));
        assert_eq!(store.list(user).unwrap().len(), 1);
    }

    #[test]
    fn rejects_blank_note() {
        let store = NotesStore::new();
        assert!(matches!(
            store.create(ChatId(1), "   "),
            Err(BotError::Validation { .. })
        ));
        assert!(!store.has_user(ChatId(1)));
    }

    #[test]
    fn notes_and_positions_follow_creation_order() {
        let store = NotesStore::new();
        let user = ChatId(3);
        for text in ["a", "b", "c"] {
            store.create(user, text).unwrap();
        }
        store.delete_at(user, 2).unwrap();
        assert_eq!(store.list(user).unwrap(), vec!["a", "c"]);
    }
}
