use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone};
use chrono_tz::Asia::Yekaterinburg;
use daybot::{
    App, BotError, BotStorage, BroadcastKind, ChatId, ManualClock, NotificationScheduler,
    Notifier, Result, ScheduleConfig, TickRunner,
};

#[derive(Default)]
struct Outbox {
    blocked: Vec<ChatId>,
    messages: Mutex<Vec<(ChatId, String)>>,
}

impl Outbox {
    fn messages_for(&self, chat: ChatId) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == chat)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
        if self.blocked.contains(&chat) {
            return Err(BotError::Delivery {
                chat,
                message: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.messages.lock().unwrap().push((chat, text.to_string()));
        Ok(())
    }
}

const ALICE: ChatId = ChatId(1001);
const BOB: ChatId = ChatId(1002);

#[tokio::test]
async fn chat_commands_drive_the_scheduler() {
    let storage = BotStorage::new(ScheduleConfig::default());
    let app = App::new(storage.clone(), 5);
    let outbox = Arc::new(Outbox {
        blocked: vec![ALICE],
        ..Default::default()
    });
    let clock = Arc::new(ManualClock::new(
        Yekaterinburg
            .with_ymd_and_hms(2024, 6, 1, 8, 58, 0)
            .unwrap(),
    ));

    app.handle(ALICE, "/start").unwrap();
    app.handle(BOB, "/start").unwrap();
    app.handle(BOB, "/create_reminder 9 0 выпить воды").unwrap();
    app.handle(BOB, "/set_time 9 0 20 0").unwrap();

    let runner = TickRunner::new(storage.clone(), outbox.clone(), clock.clone(), 5);
    let mut scheduler = NotificationScheduler::new(runner, Duration::from_secs(300));
    scheduler.start().unwrap();

    scheduler.tick_now().await.unwrap();
    clock.advance(ChronoDuration::minutes(5));
    scheduler.tick_now().await.unwrap();

    let bob = outbox.messages_for(BOB);
    let morning: Vec<_> = bob.iter().filter(|m| m.starts_with("🌅")).collect();
    let reminders: Vec<_> = bob.iter().filter(|m| m.contains("выпить воды")).collect();
    assert_eq!(morning.len(), 1);
    assert_eq!(reminders.len(), 2);
    assert!(outbox.messages_for(ALICE).is_empty());
    assert!(storage
        .broadcast
        .last_sent(BroadcastKind::Morning)
        .unwrap()
        .is_some());

    // Bob deletes the reminder; the next tick inside the window sends nothing new
    app.handle(BOB, "/delete_reminder 1").unwrap();
    clock.advance(ChronoDuration::minutes(1));
    scheduler.tick_now().await.unwrap();
    assert_eq!(outbox.messages_for(BOB).len(), 3);

    let status = scheduler.get_status();
    assert_eq!(status.ticks, 3);
    scheduler.stop().await.unwrap();
}

#[tokio::test]
async fn toggling_off_silences_everyone() {
    let storage = BotStorage::new(ScheduleConfig::default());
    let app = App::new(storage.clone(), 5);
    let outbox = Arc::new(Outbox::default());
    let clock = Arc::new(ManualClock::new(
        Yekaterinburg
            .with_ymd_and_hms(2024, 6, 1, 18, 3, 0)
            .unwrap(),
    ));
    let runner = TickRunner::new(storage.clone(), outbox.clone(), clock, 5);

    app.handle(ALICE, "/start").unwrap();
    app.handle(BOB, "/start").unwrap();
    app.handle(ALICE, "ежедневные сообщения включены").unwrap();

    let report = runner.tick().await.unwrap();
    assert!(report.evening.is_none());
    assert!(outbox.messages_for(BOB).is_empty());
    assert_eq!(storage.broadcast.last_sent(BroadcastKind::Evening).unwrap(), None);

    app.handle(ALICE, "ежедневные сообщения отключены").unwrap();
    let report = runner.tick().await.unwrap();
    assert_eq!(report.evening.unwrap().delivered(), 2);
}
