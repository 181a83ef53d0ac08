//! Chat front-end: command parsing, replies and the Telegram transport.

mod app;
mod command;
mod telegram;

pub use app::*;
pub use command::*;
pub use telegram::*;
