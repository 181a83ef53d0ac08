use std::sync::Arc;

use log::{debug, info};
use teloxide::{
    dptree,
    payloads::SendMessageSetters,
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

use crate::{App, ChatId};

/// Converts keyboard rows into a Telegram reply keyboard
fn reply_keyboard(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
    .resize_keyboard()
    .input_field_placeholder("Выберите действие...")
}

async fn handle_message(bot: Bot, msg: Message, app: Arc<App>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat = ChatId(msg.chat.id.0);
    debug!("Message from chat {}: {}", chat, text);

    let Some(reply) = app.handle(chat, text) else {
        return Ok(());
    };

    let request = bot.send_message(msg.chat.id, reply.text);
    match reply.keyboard {
        Some(rows) => request.reply_markup(reply_keyboard(rows)).await?,
        None => request.await?,
    };
    Ok(())
}

/// Long-polls Telegram and answers every text message until Ctrl+C
pub async fn run_polling(bot: Bot, app: Arc<App>) {
    info!("Starting Telegram long polling");
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![app])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
