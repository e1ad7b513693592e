//! Bookkeeping logic independent of Telegram
//!
//! - `parser`: free-text entry grammar
//! - `resolver`: fuzzy category matching
//! - `budget`: monthly limit checks and statuses
//! - `ledger`: validated writes shared by every entry point
//! - `deeplink`: `/start` payload codec
//! - `snapshot`: Mini App data bridge
//! - `miniapp`: actions posted back by the Mini App

pub mod budget;
pub mod deeplink;
pub mod format;
pub mod ledger;
pub mod miniapp;
pub mod parser;
pub mod period;
pub mod quips;
pub mod resolver;
pub mod snapshot;

pub use period::Month;
