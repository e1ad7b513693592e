//! FinGoal - personal finance Telegram bot with a companion Mini App
//!
//! Users log income and expenses as short chat messages, keep savings goals and
//! monthly budgets, and browse their data in a web view opened from the chat.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging and shared helpers
//! - `storage`: SQLite pool, migrations and per-table queries
//! - `finance`: Parsing, category matching, budgets, deep links and snapshots
//! - `conversation`: Chat flows that turn updates into replies
//! - `telegram`: Bot wiring, keyboards and the HTTP API

pub mod cli;
pub mod conversation;
pub mod core;
pub mod finance;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
