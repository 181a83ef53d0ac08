//! Chat front-end for the daybot application
//!
//! Routes parsed commands into the stores and renders the replies. Validation
//! and lookup failures end here as corrective messages for the user.
use log::{error, info};

use crate::{
    content, format_notes, format_reminders, list_index, parse_number, time_component,
    BotError, BotStorage, ChatId, Command, Result, ScheduleConfig, TimeOfDay, DAILY_BUTTON_PREFIX,
    HELP_BUTTON, NOTES_BUTTON, PHRASE_BUTTON, REMINDERS_BUTTON,
};

const HELP_TEXT: &str = "ℹ️ Доступные команды:\n\n\
📝 ЗАМЕТКИ:\n\
/create_note <текст> - Создать заметку\n\
/delete_note <номер> - Удалить заметку\n\n\
🔔 НАПОМИНАНИЯ:\n\
/create_reminder <часы> <минуты> <текст> - Создать напоминание\n\
/delete_reminder <номер> - Удалить напоминание\n\
/list_reminders - Показать все напоминания\n\n\
⚙️ ОБЩИЕ:\n\
/start - Показать клавиатуру\n\
/help - Показать справку\n\
/set_time - Установить время уведомлений\n\n\
Или используйте кнопки ниже:";

const WRONG_TIME: &str = "❌ Неверное время! Часы: 0-23, Минуты: 0-59";
const SET_TIME_USAGE: &str =
    "❌ Используйте: /set_time <утро_часы> <утро_минуты> <вечер_часы> <вечер_минуты>";
const CREATE_REMINDER_USAGE: &str = "❌ Используйте: /create_reminder <часы> <минуты> <текст>\n\n\
Пример: /create_reminder 9 30 Позвонить маме";

/// A reply to send back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Rows of reply-keyboard buttons, when the keyboard should be (re)sent
    pub keyboard: Option<Vec<Vec<String>>>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Vec<Vec<String>>) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// The main keyboard; the last button shows the global daily-message flag
pub fn main_keyboard(daily_enabled: bool) -> Vec<Vec<String>> {
    let state = if daily_enabled { "включены" } else { "отключены" };
    vec![
        vec![NOTES_BUTTON.to_string(), REMINDERS_BUTTON.to_string()],
        vec![PHRASE_BUTTON.to_string()],
        vec![HELP_BUTTON.to_string()],
        vec![format!("{} {}", DAILY_BUTTON_PREFIX, state)],
    ]
}

/// Chat application handler - processes commands and interfaces with BotStorage
#[derive(Debug, Clone)]
pub struct App {
    /// Shared stores and schedule
    storage: BotStorage,

    /// Match window quoted back to users, in minutes
    tolerance_minutes: u32,
}

impl App {
    pub fn new(storage: BotStorage, tolerance_minutes: u32) -> Self {
        Self {
            storage,
            tolerance_minutes,
        }
    }

    /// Handles one incoming message. Returns `None` when the bot stays silent.
    pub fn handle(&self, chat: ChatId, text: &str) -> Option<Reply> {
        let command = Command::parse(text);
        if let Command::UnknownCommand { name } = &command {
            info!("Ignoring unknown command /{} from chat {}", name, chat);
            return None;
        }

        match self.run(chat, command) {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!("Failed to handle message from chat {}: {}", chat, e);
                Some(Reply::text("⚠️ Что-то пошло не так, попробуйте ещё раз."))
            }
        }
    }

    /// Run the given command for `chat`
    pub fn run(&self, chat: ChatId, command: Command) -> Result<Reply> {
        match command {
            Command::Start => self.start(chat),
            Command::Help => Ok(Reply::text(HELP_TEXT)),
            Command::SetTime { args } => self.set_time(&args),
            Command::CreateNote { args } => self.create_note(chat, &args),
            Command::DeleteNote { args } => self.delete_note(chat, &args),
            Command::CreateReminder { args } => self.create_reminder(chat, &args),
            Command::DeleteReminder { args } => self.delete_reminder(chat, &args),
            Command::ListReminders => self.list_reminders(chat),
            Command::ShowNotes => self.show_notes(chat),
            Command::RandomPhrase => Ok(Reply::text(format!(
                "{}\n\ncreate by random",
                content::poem(&mut rand::thread_rng())
            ))),
            Command::ToggleDaily => self.toggle_daily(chat),
            Command::Text => Ok(Reply::text("Пожалуйста, используйте кнопки для навигации")),
            Command::UnknownCommand { .. } => Ok(Reply::text(HELP_TEXT)),
        }
    }

    fn start(&self, chat: ChatId) -> Result<Reply> {
        self.storage.broadcast.subscribe(chat)?;
        let enabled = self.storage.broadcast.is_enabled()?;
        Ok(Reply::with_keyboard(
            "👋 Привет!\n\n\
             вы можете зажать подсказку для команды чтобы ею воспользоваться.\n\n\
             Используйте кнопки ниже для управления ботом:",
            main_keyboard(enabled),
        ))
    }

    fn set_time(&self, args: &[String]) -> Result<Reply> {
        if args.len() != 4 {
            let current = self.storage.schedule.current()?;
            return Ok(Reply::text(format!(
                "⏰ Текущее время уведомлений:\n\n\
                 🌅 Утренние: {}\n\
                 🌃 Вечерние: {}\n\n\
                 Установите новое время:\n\
                 /set_time <утро_часы> <утро_минуты> <вечер_часы> <вечер_минуты>\n\n\
                 Пример: /set_time 9 0 18 0",
                current.morning, current.evening
            )));
        }

        let numbers: Option<Vec<i64>> = args.iter().map(|arg| parse_number(arg)).collect();
        let Some(numbers) = numbers else {
            return Ok(Reply::text(SET_TIME_USAGE));
        };

        let morning = TimeOfDay::new(time_component(numbers[0]), time_component(numbers[1]));
        let evening = TimeOfDay::new(time_component(numbers[2]), time_component(numbers[3]));
        let (Ok(morning), Ok(evening)) = (morning, evening) else {
            return Ok(Reply::text(WRONG_TIME));
        };

        self.storage
            .schedule
            .replace(ScheduleConfig { morning, evening })?;
        Ok(Reply::text(format!(
            "✅ Время уведомлений установлено!\n\n\
             🌅 Утренние уведомления: {}\n\
             🌃 Вечерние уведомления: {}\n\n\
             Уведомления будут отправляться в указанное время ±{} минут",
            morning, evening, self.tolerance_minutes
        )))
    }

    fn create_note(&self, chat: ChatId, args: &[String]) -> Result<Reply> {
        if args.is_empty() {
            let notes = self.storage.notes.list(chat)?;
            if notes.is_empty() {
                return Ok(Reply::text(
                    "📝 У вас пока нет заметок.\n\nИспользуйте: /create_note <текст>",
                ));
            }
            return Ok(Reply::text(format!(
                "📋 Ваши заметки:\n\n{}",
                format_notes(&notes)
            )));
        }

        let text = args.join(" ");
        self.storage.notes.create(chat, &text)?;
        Ok(Reply::text(format!(
            "✅ Заметка создана!\n\n📝 Текст: {}",
            text
        )))
    }

    fn delete_note(&self, chat: ChatId, args: &[String]) -> Result<Reply> {
        let [arg] = args else {
            return Ok(Reply::text("❌ Используйте: /delete_note <номер заметки>"));
        };
        let Some(number) = parse_number(arg) else {
            return Ok(Reply::text("❌ Номер заметки должен быть числом."));
        };

        match self.storage.notes.delete_at(chat, list_index(number)) {
            Ok(deleted) => Ok(Reply::text(format!("✅ Заметка удалена:\n\n📝 {}", deleted))),
            Err(BotError::NotFound { available: 0, .. }) => Ok(Reply::text(
                "📝 У вас пока нет заметок для удаления.",
            )),
            Err(BotError::NotFound { available, .. }) => Ok(Reply::text(format!(
                "❌ Неверный номер заметки. У вас есть заметки с 1 по {}.",
                available
            ))),
            Err(e) => Err(e),
        }
    }

    fn show_notes(&self, chat: ChatId) -> Result<Reply> {
        let notes = self.storage.notes.list(chat)?;
        if notes.is_empty() {
            return Ok(Reply::text("📝 У вас пока нет заметок."));
        }
        Ok(Reply::text(format!(
            "📋 Ваши заметки:\n\n{}",
            format_notes(&notes)
        )))
    }

    fn create_reminder(&self, chat: ChatId, args: &[String]) -> Result<Reply> {
        let [hour, minute, words @ ..] = args else {
            return Ok(Reply::text(CREATE_REMINDER_USAGE));
        };
        if words.is_empty() {
            return Ok(Reply::text(CREATE_REMINDER_USAGE));
        }

        let (Some(hour), Some(minute)) = (parse_number(hour), parse_number(minute)) else {
            return Ok(Reply::text("❌ Ошибка: часы и минуты должны быть числами"));
        };
        let text = words.join(" ");

        let position = match self.storage.reminders.create(
            chat,
            time_component(hour),
            time_component(minute),
            &text,
        ) {
            Ok(position) => position,
            Err(BotError::Validation { .. }) => return Ok(Reply::text(WRONG_TIME)),
            Err(e) => return Err(e),
        };

        Ok(Reply::text(format!(
            "✅ Напоминание создано!\n\n\
             🔔 Номер: {position}\n\
             ⏰ Время: {:02}:{:02}\n\
             📝 Текст: {text}\n\n\
             Чтобы удалить: /delete_reminder {position}",
            hour, minute
        )))
    }

    fn delete_reminder(&self, chat: ChatId, args: &[String]) -> Result<Reply> {
        let [arg] = args else {
            return Ok(Reply::text("❌ Используйте: /delete_reminder <номер напоминания>"));
        };
        let Some(number) = parse_number(arg) else {
            return Ok(Reply::text("❌ Номер напоминания должен быть числом."));
        };

        match self.storage.reminders.delete_at(chat, list_index(number)) {
            Ok(removed) => Ok(Reply::text(format!(
                "✅ Напоминание удалено!\n\n\
                 🔔 Номер: {}\n\
                 ⏰ Время: {}\n\
                 📝 Текст: {}",
                number, removed.time, removed.text
            ))),
            Err(BotError::NotFound { .. }) => Ok(Reply::text(
                "❌ Напоминание с таким номером не найдено.",
            )),
            Err(e) => Err(e),
        }
    }

    fn list_reminders(&self, chat: ChatId) -> Result<Reply> {
        let reminders = self.storage.reminders.list(chat)?;
        if reminders.is_empty() {
            return Ok(Reply::text(
                "🔔 У вас пока нет напоминаний.\n\n\
                 Чтобы создать напоминание, используйте:\n\
                 /create_reminder <часы> <минуты> <текст>\n\n\
                 Пример: /create_reminder 9 30 Позвонить маме",
            ));
        }
        Ok(Reply::text(format!(
            "📋 Ваши напоминания:\n\n{}\n\n💡 Чтобы удалить напоминание: /delete_reminder <номер>",
            format_reminders(&reminders)
        )))
    }

    fn toggle_daily(&self, chat: ChatId) -> Result<Reply> {
        let enabled = self.storage.broadcast.toggle(chat)?;
        let text = if enabled {
            "Ежедневные сообщения включены!"
        } else {
            "Ежедневные сообщения отключены!"
        };
        Ok(Reply::with_keyboard(text, main_keyboard(enabled)))
    }
}
