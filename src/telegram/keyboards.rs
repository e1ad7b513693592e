//! Conversion of transport-neutral keyboards into Telegram markup

use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ReplyMarkup,
    WebAppInfo,
};
use url::Url;

use crate::conversation::{Button, ButtonAction, Keyboard, MenuButton};

fn web_app_info(url: &str) -> Option<WebAppInfo> {
    match Url::parse(url) {
        Ok(url) => Some(WebAppInfo { url }),
        Err(e) => {
            log::error!("Invalid Web App URL '{}': {}", url, e);
            None
        }
    }
}

fn inline_button(button: &Button) -> Option<InlineKeyboardButton> {
    match &button.action {
        ButtonAction::Callback(data) => Some(InlineKeyboardButton::callback(button.text.clone(), data.clone())),
        ButtonAction::WebApp(url) => web_app_info(url).map(|info| InlineKeyboardButton::web_app(button.text.clone(), info)),
    }
}

/// Inline markup; Web App buttons with a broken URL are dropped
pub fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| row.iter().filter_map(inline_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    InlineKeyboardMarkup::new(rows)
}

/// Persistent main keyboard; the first button opens the Mini App at `app_url`
pub fn main_menu(app_url: &str) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = MenuButton::LAYOUT
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    let key = KeyboardButton::new(button.label());
                    match (button.opens_web_app(), web_app_info(app_url)) {
                        (true, Some(info)) => key.request(ButtonRequest::WebApp(info)),
                        _ => key,
                    }
                })
                .collect()
        })
        .collect();
    KeyboardMarkup::new(rows).resize_keyboard()
}

pub fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::MainMenu { app_url } => ReplyMarkup::Keyboard(main_menu(app_url)),
    }
}
