//! [`Sink`] implementation over a teloxide `Bot`.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::debug;

use mentor_core::outbound::{Keyboard, OutboundMessage, Sink, SinkError};

use crate::send::send_chunked;

pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot_token: &str) -> Self {
        Self {
            bot: Bot::new(bot_token),
        }
    }
}

/// Render the transport-agnostic keyboard as Telegram inline buttons.
fn to_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.data.clone()))
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl Sink for TelegramSink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SinkError> {
        let chat_id = ChatId(message.chat_id);
        let markup = message.keyboard.as_ref().map(to_markup);

        debug!(chat_id = message.chat_id, bytes = message.body.len(), "telegram: sending");

        send_chunked(&self.bot, chat_id, &message.body, markup)
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))
    }
}
