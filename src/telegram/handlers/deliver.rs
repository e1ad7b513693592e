//! Turns a flow [`Outcome`] into Bot API calls

use teloxide::prelude::*;
use teloxide::types::MessageId;

use super::types::HandlerDeps;
use crate::conversation::{Delivery, Keyboard, Outcome, Reply};
use crate::telegram::keyboards::{inline_markup, reply_markup};
use crate::telegram::markdown::{edit_message_markdown_v2, send_message_markdown_v2};
use crate::telegram::menu_button::refresh_menu_button;
use crate::telegram::Bot;

/// Where an update came from
#[derive(Debug, Clone, Copy)]
pub struct Source {
    pub chat_id: ChatId,
    pub user_id: i64,
    /// The user's message, or the bot message carrying the pressed button
    pub message_id: Option<MessageId>,
}

async fn send_reply(bot: &Bot, source: &Source, reply: Reply) -> ResponseResult<()> {
    if let (Delivery::EditSource, Some(message_id)) = (reply.delivery, source.message_id) {
        let keyboard = match &reply.keyboard {
            Some(Keyboard::Inline(rows)) => Some(inline_markup(rows)),
            _ => None,
        };
        return edit_message_markdown_v2(bot, source.chat_id, message_id, reply.text, keyboard).await;
    }

    let markup = reply.keyboard.as_ref().map(reply_markup);
    send_message_markdown_v2(bot, source.chat_id, reply.text, markup).await?;
    Ok(())
}

/// Sends replies in order, then deletes the source message and refreshes the menu button when asked.
///
/// Errors are logged; one failed reply does not stop the rest.
pub async fn deliver(bot: &Bot, deps: &HandlerDeps, source: Source, outcome: Outcome) {
    for reply in outcome.replies {
        if let Err(e) = send_reply(bot, &source, reply).await {
            log::error!("Failed to send reply to chat {}: {}", source.chat_id, e);
        }
    }

    if outcome.delete_source {
        if let Some(message_id) = source.message_id {
            if let Err(e) = bot.delete_message(source.chat_id, message_id).await {
                log::debug!("Could not delete message {} in chat {}: {}", message_id.0, source.chat_id, e);
            }
        }
    }

    if outcome.refresh_menu {
        refresh_menu_button(bot, &deps.db_pool, &deps.webapp_url, source.user_id).await;
    }
}

/// Reply used when a flow itself failed
pub fn failure_outcome() -> Outcome {
    Outcome::text("❌ Что\\-то пошло не так\\. Попробуйте ещё раз\\.")
}
