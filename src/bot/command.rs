//! Parsing of incoming chat text into commands and button presses.

pub const NOTES_BUTTON: &str = "📝 заметки";
pub const REMINDERS_BUTTON: &str = "🔔 напоминания";
pub const PHRASE_BUTTON: &str = "✍️ хочу интересную фразу";
pub const HELP_BUTTON: &str = "❓помощь";
pub const DAILY_BUTTON_PREFIX: &str = "ежедневные сообщения";

/// Everything a user can ask the bot to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the keyboard and subscribe to daily messages
    Start,
    Help,
    /// Show or replace the broadcast times
    SetTime { args: Vec<String> },
    /// Create a note, or list notes when no text is given
    CreateNote { args: Vec<String> },
    DeleteNote { args: Vec<String> },
    CreateReminder { args: Vec<String> },
    DeleteReminder { args: Vec<String> },
    ListReminders,
    ShowNotes,
    RandomPhrase,
    ToggleDaily,
    /// A slash command the bot does not know; ignored
    UnknownCommand { name: String },
    /// Free text that is neither a command nor a button
    Text,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        let Some(body) = text.strip_prefix('/') else {
            return Self::parse_button(text);
        };

        let mut tokens = body.split_whitespace();
        let head = tokens.next().unwrap_or_default();
        // "/cmd@botname" in group chats
        let name = head.split('@').next().unwrap_or_default();
        let args: Vec<String> = tokens.map(str::to_string).collect();

        match name {
            "start" => Command::Start,
            "help" => Command::Help,
            "set_time" => Command::SetTime { args },
            "create_note" => Command::CreateNote { args },
            "delete_note" => Command::DeleteNote { args },
            "create_reminder" => Command::CreateReminder { args },
            "delete_reminder" => Command::DeleteReminder { args },
            "list_reminders" => Command::ListReminders,
            other => Command::UnknownCommand {
                name: other.to_string(),
            },
        }
    }

    fn parse_button(text: &str) -> Self {
        match text {
            NOTES_BUTTON => Command::ShowNotes,
            REMINDERS_BUTTON => Command::ListReminders,
            PHRASE_BUTTON => Command::RandomPhrase,
            HELP_BUTTON => Command::Help,
            _ if text.starts_with(DAILY_BUTTON_PREFIX) => Command::ToggleDaily,
            _ => Command::Text,
        }
    }
}
