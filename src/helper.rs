use crate::ReminderEntry;

/// Parses a whole number argument, allowing a sign
pub fn parse_number(arg: &str) -> Option<i64> {
    arg.trim().parse().ok()
}

/// Converts a parsed hour or minute into the store's unsigned form.
/// Negative values map to a value every range check rejects.
pub fn time_component(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Converts a 1-based user index; anything below 1 becomes 0, which no list contains
pub fn list_index(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

// Numbered list of notes: "1. text"
pub fn format_notes(notes: &[String]) -> String {
    notes
        .iter()
        .enumerate()
        .map(|(i, note)| format!("{}. {}", i + 1, note))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_reminders(reminders: &[ReminderEntry]) -> String {
    reminders
        .iter()
        .enumerate()
        .map(|(i, reminder)| {
            format!(
                "🔔 {}. В {}\n   📝 {}",
                i + 1,
                reminder.time,
                reminder.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
