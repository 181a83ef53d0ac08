//! Telegram assistant for notes, reminders and daily messages
//!
//! This library keeps per-user notes and time-of-day reminders in memory and runs
//! a periodic scheduler that delivers due reminders and two shared daily
//! broadcasts (a morning quote and an evening poem) to subscribed chats.

mod bot;
mod broadcast;
mod cli;
mod clock;
mod config;
pub mod content;
mod errors;
mod helper;
mod note;
mod notifier;
mod reminder;
mod scheduler;
mod storage;
mod types;
pub mod web;

// Re-export key components
pub use bot::*;
pub use broadcast::*;
pub use cli::*;
pub use clock::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use note::*;
pub use notifier::*;
pub use reminder::*;
pub use scheduler::*;
pub use storage::*;
pub use types::*;
