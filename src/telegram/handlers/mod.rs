//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The handlers are organized in a testable way, allowing integration tests
//! to use the same handler tree as production code.

mod deliver;
mod schema;
mod types;

pub use deliver::{deliver, Source};
pub use schema::schema;
pub use types::{register_user, HandlerDeps, HandlerError, UserInfo};
