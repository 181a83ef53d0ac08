//! Per-user reminder lists.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use log::{debug, info};

use crate::{BotError, ChatId, ItemKind, ReminderEntry, Result, TimeOfDay};

/// In-memory reminder lists indexed by chat.
///
/// Lists are created on the first reminder and dropped again once their last
/// entry is deleted, so the map only contains users that have reminders.
#[derive(Debug, Clone, Default)]
pub struct ReminderStore {
    reminders: Arc<Mutex<HashMap<ChatId, Vec<ReminderEntry>>>>,
}

impl ReminderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reminder and returns its 1-based position in the user's list
    pub fn create(&self, user: ChatId, hour: u32, minute: u32, text: &str) -> Result<usize> {
        let time = TimeOfDay::new(hour, minute)?;

        let mut reminders = self
            .reminders
            .lock()
            .map_err(|_| BotError::poisoned("reminders"))?;
        let list = reminders.entry(user).or_default();
        list.push(ReminderEntry {
            time,
            text: text.to_string(),
        });

        let position = list.len();
        info!("Reminder #{} created for chat {} at {}", position, user, time);
        Ok(position)
    }

    /// Returns the user's reminders in creation order
    pub fn list(&self, user: ChatId) -> Result<Vec<ReminderEntry>> {
        let reminders = self
            .reminders
            .lock()
            .map_err(|_| BotError::poisoned("reminders"))?;
        Ok(reminders.get(&user).cloned().unwrap_or_default())
    }

    /// Removes the reminder at the 1-based `index`
    pub fn delete_at(&self, user: ChatId, index: usize) -> Result<ReminderEntry> {
        let mut reminders = self
            .reminders
            .lock()
            .map_err(|_| BotError::poisoned("reminders"))?;

        let list = match reminders.get_mut(&user) {
            Some(list) if (1..=list.len()).contains(&index) => list,
            other => {
                return Err(BotError::NotFound {
                    kind: ItemKind::Reminder,
                    index,
                    available: other.map_or(0, |list| list.len()),
                });
            }
        };

        let removed = list.remove(index - 1);
        if list.is_empty() {
            reminders.remove(&user);
            debug!("Dropped empty reminder list for chat {}", user);
        }

        info!("Reminder #{} deleted for chat {}", index, user);
        Ok(removed)
    }

    /// Copies every user's list so a scan can run without holding the lock
    pub fn snapshot(&self) -> Result<Vec<(ChatId, Vec<ReminderEntry>)>> {
        let reminders = self
            .reminders
            .lock()
            .map_err(|_| BotError::poisoned("reminders"))?;
        let mut snapshot: Vec<_> = reminders
            .iter()
            .map(|(user, list)| (*user, list.clone()))
            .collect();
        snapshot.sort_by_key(|(user, _)| *user);
        Ok(snapshot)
    }

    /// Whether the `occurrence`-th copy (0-based) of `entry` in a snapshot is
    /// still in the user's list.
    ///
    /// Identical reminders are allowed, so a copy counts as scheduled only while
    /// the live list holds more than `occurrence` equal entries.
    pub fn is_still_scheduled(
        &self,
        user: ChatId,
        occurrence: usize,
        entry: &ReminderEntry,
    ) -> bool {
        match self.reminders.lock() {
            Ok(reminders) => reminders.get(&user).is_some_and(|list| {
                list.iter().filter(|live| *live == entry).count() > occurrence
            }),
            Err(_) => false,
        }
    }

    pub fn has_user(&self, user: ChatId) -> bool {
        self.reminders
            .lock()
            .map(|reminders| reminders.contains_key(&user))
            .unwrap_or(false)
    }
}
