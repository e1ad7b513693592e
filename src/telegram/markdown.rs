use crate::core::utils::escape_markdown_v2;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId, ParseMode, ReplyMarkup};
use teloxide::RequestError;

use crate::telegram::Bot;

fn is_markdown_parse_error(err: &RequestError) -> bool {
    err.to_string().to_lowercase().contains("can't parse entities")
}

fn is_not_modified(err: &RequestError) -> bool {
    err.to_string().to_lowercase().contains("message is not modified")
}

/// Send a MarkdownV2 message and auto-escape on parse errors.
pub async fn send_message_markdown_v2(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    markup: Option<ReplyMarkup>,
) -> ResponseResult<Message> {
    let raw_text = text.into();
    let mut req = bot
        .send_message(chat_id, raw_text.clone())
        .parse_mode(ParseMode::MarkdownV2);
    if let Some(kb) = markup.clone() {
        req = req.reply_markup(kb);
    }

    match req.await {
        Ok(msg) => Ok(msg),
        Err(e) if is_markdown_parse_error(&e) => {
            log::warn!("MarkdownV2 rejected, resending escaped: {}", e);
            let escaped = escape_markdown_v2(&raw_text);
            let mut retry = bot.send_message(chat_id, escaped).parse_mode(ParseMode::MarkdownV2);
            if let Some(kb) = markup {
                retry = retry.reply_markup(kb);
            }
            retry.await
        }
        Err(e) => Err(e),
    }
}

/// Edit a message in place with MarkdownV2, same fallback as [`send_message_markdown_v2`].
///
/// "Message is not modified" is not an error: pressing the same navigation button twice is normal.
pub async fn edit_message_markdown_v2(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
) -> ResponseResult<()> {
    let raw_text = text.into();
    let mut req = bot
        .edit_message_text(chat_id, message_id, raw_text.clone())
        .parse_mode(ParseMode::MarkdownV2);
    if let Some(kb) = keyboard.clone() {
        req = req.reply_markup(kb);
    }

    match req.await {
        Ok(_) => Ok(()),
        Err(e) if is_not_modified(&e) => Ok(()),
        Err(e) if is_markdown_parse_error(&e) => {
            log::warn!("MarkdownV2 rejected on edit, retrying escaped: {}", e);
            let mut retry = bot
                .edit_message_text(chat_id, message_id, escape_markdown_v2(&raw_text))
                .parse_mode(ParseMode::MarkdownV2);
            if let Some(kb) = keyboard {
                retry = retry.reply_markup(kb);
            }
            retry.await.map(|_| ())
        }
        Err(e) => Err(e),
    }
}
