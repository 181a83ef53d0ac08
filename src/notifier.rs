//! Outbound message delivery.
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use teloxide::{prelude::Requester, Bot};

use crate::{BotError, ChatId, DeliveryOutcome, DeliveryReport, Result};

/// Delivers a text message to one chat
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, chat: ChatId, text: &str) -> Result<()>;
}

/// Sends `text` to every recipient in turn.
///
/// A failure for one recipient is logged and recorded in the report; it never
/// stops delivery to the remaining recipients and is not retried.
pub async fn deliver_all(
    notifier: &dyn Notifier,
    recipients: &[ChatId],
    text: &str,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    for &chat in recipients {
        let error = match notifier.send(chat, text).await {
            Ok(()) => {
                debug!("Message delivered to chat {}", chat);
                None
            }
            Err(e) => {
                warn!("Failed to deliver message to chat {}: {}", chat, e);
                Some(e.to_string())
            }
        };
        report.push(DeliveryOutcome { chat, error });
    }
    report
}

/// Notifier backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, timeout: Duration) -> Self {
        Self { bot, timeout }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat: ChatId, text: &str) -> Result<()> {
        let request = async {
            self.bot
                .send_message(teloxide::types::ChatId(chat.0), text.to_string())
                .await
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BotError::Delivery {
                chat,
                message: e.to_string(),
            }),
            Err(_) => Err(BotError::Delivery {
                chat,
                message: format!("timed out after {}s", self.timeout.as_secs()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyNotifier {
        failing: Vec<ChatId>,
        sent: Mutex<Vec<ChatId>>,
    }

    #[async_trait]
    impl Notifier for FlakyNotifier {
        async fn send(&self, chat: ChatId, _text: &str) -> Result<()> {
            if self.failing.contains(&chat) {
                return Err(BotError::Delivery {
                    chat,
                    message: "bot was blocked by the user".to_string(),
                });
            }
            self.sent.lock().unwrap().push(chat);
            Ok(())
        }
    }

    #[tokio::test]
    async fn failure_for_one_recipient_does_not_stop_the_rest() {
        let notifier = FlakyNotifier {
            failing: vec![ChatId(1)],
            sent: Mutex::new(Vec::new()),
        };

        let report = deliver_all(&notifier, &[ChatId(1), ChatId(2), ChatId(3)], "hi").await;

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.delivered_to(), vec![ChatId(2), ChatId(3)]);
        assert_eq!(*notifier.sent.lock().unwrap(), vec![ChatId(2), ChatId(3)]);
        assert!(report.outcomes[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("blocked")));
    }
}
