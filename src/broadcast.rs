//! Subscriber set and once-per-day bookkeeping for the shared broadcasts.
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::NaiveDate;
use log::{debug, info};

use crate::{BotError, BroadcastKind, ChatId, Result};

#[derive(Debug)]
struct BroadcastInner {
    enabled: bool,
    subscribers: HashSet<ChatId>,
    last_morning: Option<NaiveDate>,
    last_evening: Option<NaiveDate>,
}

/// Point-in-time copy of the broadcast state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSnapshot {
    pub enabled: bool,
    pub subscribers: Vec<ChatId>,
    pub last_morning: Option<NaiveDate>,
    pub last_evening: Option<NaiveDate>,
}

/// Shared daily broadcast state.
///
/// The `enabled` flag is global while subscription is per chat; a broadcast is
/// delivered only to subscribers and only while the flag is on.
#[derive(Debug, Clone)]
pub struct DailyBroadcastState {
    inner: Arc<Mutex<BroadcastInner>>,
}

impl Default for DailyBroadcastState {
    fn default() -> Self {
        Self::new()
    }
}

impl DailyBroadcastState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BroadcastInner {
                enabled: true,
                subscribers: HashSet::new(),
                last_morning: None,
                last_evening: None,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BroadcastInner>> {
        self.inner
            .lock()
            .map_err(|_| BotError::poisoned("broadcast state"))
    }

    /// Adds a chat to the subscriber set without touching the global flag
    pub fn subscribe(&self, user: ChatId) -> Result<()> {
        if self.lock()?.subscribers.insert(user) {
            debug!("Chat {} subscribed to daily messages", user);
        }
        Ok(())
    }

    /// Flips daily messages for `user` and returns the new global flag.
    ///
    /// While the flag is on, a subscribed caller is removed and the flag is
    /// switched off. In every other case the caller is added and the flag is
    /// switched on, so a toggle while disabled always turns messages back on.
    pub fn toggle(&self, user: ChatId) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.enabled && inner.subscribers.contains(&user) {
            inner.subscribers.remove(&user);
            inner.enabled = false;
        } else {
            inner.subscribers.insert(user);
            inner.enabled = true;
        }
        info!(
            "Daily messages toggled by chat {}: enabled={}, subscribers={}",
            user,
            inner.enabled,
            inner.subscribers.len()
        );
        Ok(inner.enabled)
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(self.lock()?.enabled)
    }

    pub fn is_subscribed(&self, user: ChatId) -> Result<bool> {
        Ok(self.lock()?.subscribers.contains(&user))
    }

    /// Recipients for a broadcast, or `None` if broadcasting is off or nobody subscribed
    pub fn recipients(&self) -> Result<Option<Vec<ChatId>>> {
        let inner = self.lock()?;
        if !inner.enabled || inner.subscribers.is_empty() {
            return Ok(None);
        }
        let mut recipients: Vec<ChatId> = inner.subscribers.iter().copied().collect();
        recipients.sort();
        Ok(Some(recipients))
    }

    pub fn last_sent(&self, kind: BroadcastKind) -> Result<Option<NaiveDate>> {
        let inner = self.lock()?;
        Ok(match kind {
            BroadcastKind::Morning => inner.last_morning,
            BroadcastKind::Evening => inner.last_evening,
        })
    }

    pub fn already_sent(&self, kind: BroadcastKind, today: NaiveDate) -> Result<bool> {
        Ok(self.last_sent(kind)? == Some(today))
    }

    /// Records that the `kind` broadcast was attempted on `today`
    pub fn mark_sent(&self, kind: BroadcastKind, today: NaiveDate) -> Result<()> {
        let mut inner = self.lock()?;
        match kind {
            BroadcastKind::Morning => inner.last_morning = Some(today),
            BroadcastKind::Evening => inner.last_evening = Some(today),
        }
        info!("Remembered {} broadcast date: {}", kind, today);
        Ok(())
    }

    pub fn snapshot(&self) -> Result<BroadcastSnapshot> {
        let inner = self.lock()?;
        let mut subscribers: Vec<ChatId> = inner.subscribers.iter().copied().collect();
        subscribers.sort();
        Ok(BroadcastSnapshot {
            enabled: inner.enabled,
            subscribers,
            last_morning: inner.last_morning,
            last_evening: inner.last_evening,
        })
    }
}
