//! Core data structures for the daybot application.
//!
//! This module contains the primary types shared by the stores, the scheduler
//! and the chat front-end.
use std::fmt;

use serde::Serialize;

use crate::BotError;

/// A specialized Result type for daybot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Identity of a chat that can receive messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    /// Creates a time of day, rejecting hours outside 0-23 and minutes outside 0-59
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(BotError::Validation {
                message: format!(
                    "time {}:{} is out of range (hours 0-23, minutes 0-59)",
                    hour, minute
                ),
            });
        }
        Ok(Self { hour, minute })
    }

    /// Const constructor for literal times; panics at compile time when out of range
    pub const fn at(hour: u32, minute: u32) -> Self {
        assert!(hour < 24 && minute < 60);
        Self { hour, minute }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Minutes elapsed since midnight
    pub fn minute_of_day(&self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// A single reminder owned by one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEntry {
    /// When the reminder fires every day
    pub time: TimeOfDay,
    /// Text delivered to the user
    pub text: String,
}

/// The two shared daily broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BroadcastKind {
    Morning,
    Evening,
}

impl fmt::Display for BroadcastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastKind::Morning => write!(f, "morning"),
            BroadcastKind::Evening => write!(f, "evening"),
        }
    }
}

/// Result of one send attempt to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub chat: ChatId,
    /// `None` when the message was handed over successfully
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-recipient results of one send sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    pub fn push(&mut self, outcome: DeliveryOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.delivered()
    }

    /// Recipients whose delivery succeeded
    pub fn delivered_to(&self) -> Vec<ChatId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_delivered())
            .map(|o| o.chat)
            .collect()
    }

    pub fn extend(&mut self, other: DeliveryReport) {
        self.outcomes.extend(other.outcomes);
    }
}

/// Summary of one scheduler tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Set when the morning broadcast fired on this tick
    pub morning: Option<DeliveryReport>,
    /// Set when the evening broadcast fired on this tick
    pub evening: Option<DeliveryReport>,
    /// Reminders sent on this tick
    pub reminders: DeliveryReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_rejects_out_of_range() {
        assert!(TimeOfDay::new(24, 0).is_err());
        assert!(TimeOfDay::new(0, 60).is_err());
        assert!(TimeOfDay::new(23, 59).is_ok());
    }

    #[test]
    fn time_of_day_formats_with_padding() {
        let t = TimeOfDay::new(9, 5).unwrap();
        assert_eq!(t.to_string(), "09:05");
        assert_eq!(t.minute_of_day(), 545);
    }

    #[test]
    fn delivery_report_counts() {
        let mut report = DeliveryReport::default();
        report.push(DeliveryOutcome {
            chat: ChatId(1),
            error: Some("blocked".to_string()),
        });
        report.push(DeliveryOutcome {
            chat: ChatId(2),
            error: None,
        });
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.delivered_to(), vec![ChatId(2)]);
    }
}
