//! Per-user chat menu button that opens the Mini App with fresh data

use chrono::NaiveDateTime;
use teloxide::prelude::*;
use teloxide::types::{MenuButton, WebAppInfo};

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::finance::snapshot;
use crate::storage::{get_connection, DbPool};
use crate::telegram::Bot;

pub const MENU_BUTTON_TEXT: &str = "📱 Мои Деньги";

/// Snapshot URL for the menu button: a short snapshot plus a cache-busting version
pub fn menu_button_url(pool: &DbPool, webapp_url: &str, user_id: i64, now: NaiveDateTime) -> AppResult<String> {
    let conn = get_connection(pool)?;
    snapshot::snapshot_url(
        &conn,
        webapp_url,
        user_id,
        config::limits::MENU_SNAPSHOT_TRANSACTIONS,
        now,
        Some(chrono::Utc::now().timestamp()),
    )
}

/// Rebuilds the menu button of `user_id`. Failures are logged, the chat keeps the old button.
pub async fn refresh_menu_button(bot: &Bot, pool: &DbPool, webapp_url: &str, user_id: i64) {
    let now = chrono::Local::now().naive_local();
    let url = match menu_button_url(pool, webapp_url, user_id, now)
        .and_then(|url| url::Url::parse(&url).map_err(|e| AppError::Payload(e.to_string())))
    {
        Ok(url) => url,
        Err(e) => {
            log::error!("Failed to build menu button for user {}: {}", user_id, e);
            return;
        }
    };

    let button = MenuButton::WebApp {
        text: MENU_BUTTON_TEXT.to_string(),
        web_app: WebAppInfo { url },
    };
    match bot.set_chat_menu_button().chat_id(ChatId(user_id)).menu_button(button).await {
        Ok(_) => log::debug!("Menu button refreshed for user {}", user_id),
        Err(e) => log::warn!("Failed to set menu button for user {}: {}", user_id, e),
    }
}
