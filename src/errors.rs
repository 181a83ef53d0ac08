//! Error types for the daybot application.
//!
//! This module defines custom error types that categorize the failures that can
//! occur while handling chat commands and running the notification scheduler.

use std::io;

use thiserror::Error;

use crate::ChatId;

/// The kind of user-owned item an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Note,
    Reminder,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Note => write!(f, "note"),
            ItemKind::Reminder => write!(f, "reminder"),
        }
    }
}

/// The main error type for the daybot application.
#[derive(Error, Debug)]
pub enum BotError {
    /// Malformed command arguments or out-of-range values.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A delete referenced an index that does not exist for the user.
    #[error("{kind} #{index} not found ({available} available)")]
    NotFound {
        kind: ItemKind,
        index: usize,
        available: usize,
    },

    /// Sending a message to one recipient failed.
    #[error("Delivery to chat {chat} failed: {message}")]
    Delivery { chat: ChatId, message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Errors related to socket or file I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors raised by the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// for mutex lock acquisition issues
    #[error("{message}")]
    LockAcquisitionFailed { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}

impl BotError {
    pub(crate) fn poisoned(what: &str) -> Self {
        BotError::LockAcquisitionFailed {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
