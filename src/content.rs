//! Message bodies for the daily broadcasts and reminders.
use rand::{seq::SliceRandom, Rng};

use crate::BroadcastKind;

const QUOTES: &[&str] = &[
    "Каждый день — это новый шанс стать лучше!",
    "Верь в себя, и ты будешь неудержим!",
    "Твои мечты стоят того, чтобы за них бороться.",
    "Не сдавайся — великие дела требуют времени.",
    "Успех — это сумма маленьких усилий, повторяемых изо дня в день.",
    "Ты способен на большее, чем думаешь!",
    "Ошибки — это ступени к успеху.",
    "Начни там, где ты есть. Используй то, что у тебя есть. Делай что можешь.",
    "Сегодняшние трудности завтра станут твоей силой.",
    "Действие — ключевой элемент успеха.",
    "Ты ближе к цели, чем был вчера.",
    "Позитивное мышление привлекает позитивные результаты.",
    "Твоё время пришло! Действуй без промедлений.",
    "Никогда не недооценивай себя. Ты уникален!",
    "Самый простой способ добиться успеха — никогда не сдаваться.",
];

const ADJECTIVES: &[&str] = &[
    "заботливая",
    "мудрая",
    "прекрасная",
    "добрая",
    "умная",
    "организованная",
];
const ACTIONS: &[&str] = &["учила", "вдохновляла", "поддерживала", "воспитывала"];
const CONTEXTS: &[&str] = &["путешествий", "учёбы", "отдыха", "трудностей"];
const MEMORIES: &[&str] = &[
    "научила меня читать",
    "записала меня на шахматы",
    "записала меня в кванториум",
    "сводила меня в галлилео",
    "скачала мне фильм жил был человек",
];

fn pick<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// One motivational quote, chosen uniformly
pub fn motivational_quote<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(QUOTES, rng)
}

/// A short poem assembled from random word slots
pub fn poem<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "Дорогая мама, ты такая {},\n\
         Ты всегда меня {} во время {}.\n\
         Помню, как ты {}\n\
         Спасибо за всё! Люблю тебя больше всего на свете!",
        pick(ADJECTIVES, rng),
        pick(ACTIONS, rng),
        pick(CONTEXTS, rng),
        pick(MEMORIES, rng),
    )
}

/// Full text of a daily broadcast
pub fn broadcast_message<R: Rng + ?Sized>(kind: BroadcastKind, rng: &mut R) -> String {
    match kind {
        BroadcastKind::Morning => format!(
            "🌅 Доброе утро! Хорошего дня! 🌞\n\n{}",
            motivational_quote(rng)
        ),
        BroadcastKind::Evening => format!(
            "🌃 Добрый вечер! 🌙\n\n{}\n\n💫 Пусть этот вечер принесет умиротворение и приятные мысли!",
            poem(rng)
        ),
    }
}

pub fn reminder_message(text: &str) -> String {
    format!("🔔 Напоминание!\n\n{}", text)
}
