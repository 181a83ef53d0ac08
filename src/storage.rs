use crate::{DailyBroadcastState, NotesStore, ReminderStore, ScheduleConfig, ScheduleHandle};

/// All process-lifetime state shared between chat handlers and the scheduler.
///
/// Every field is a cheap handle onto shared data, so clones observe the same
/// notes, reminders, subscribers and schedule. Nothing is persisted: a restart
/// starts again from empty stores and the configured schedule.
#[derive(Debug, Clone, Default)]
pub struct BotStorage {
    pub notes: NotesStore,
    pub reminders: ReminderStore,
    pub broadcast: DailyBroadcastState,
    pub schedule: ScheduleHandle,
}

impl BotStorage {
    pub fn new(schedule: ScheduleConfig) -> Self {
        Self {
            notes: NotesStore::new(),
            reminders: ReminderStore::new(),
            broadcast: DailyBroadcastState::new(),
            schedule: ScheduleHandle::new(schedule),
        }
    }
}
