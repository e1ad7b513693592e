//! Telegram bot integration and handlers

pub mod api;
pub mod bot;
pub mod handlers;
pub mod keyboards;
pub mod markdown;
pub mod menu_button;
pub mod webapp_auth;

/// Bot type used across the crate
pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use api::{create_api_router, run_api_server, ApiState};
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use menu_button::refresh_menu_button;
