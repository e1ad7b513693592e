use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Public address of the companion Mini App (static web view)
/// Read from WEB_APP_URL environment variable
pub static WEB_APP_URL: Lazy<String> = Lazy::new(|| {
    env::var("WEB_APP_URL").unwrap_or_else(|_| "https://sergeychistiy14-ai.github.io/money_app/".to_string())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: finance_pro.db
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "finance_pro.db".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: bot_debug.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "bot_debug.log".to_string()));

/// Parses a boolean flag from the environment ("1", "true", "yes", "on")
fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(value) => matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

/// HTTP API used by the Mini App to post records directly
pub mod api {
    use super::*;

    /// Whether the HTTP API server starts together with the bot
    /// Read from API_ENABLED (default: true)
    pub static ENABLED: Lazy<bool> = Lazy::new(|| env_flag("API_ENABLED", true));

    /// Interface to bind, read from API_BIND_ADDR (default: 0.0.0.0)
    pub static BIND_ADDR: Lazy<String> =
        Lazy::new(|| env::var("API_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()));

    /// Port to listen on, read from API_PORT (default: 8080)
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080)
    });

    /// Require a signed `X-Telegram-Init-Data` header on every write
    /// Read from API_REQUIRE_INIT_DATA (default: false)
    pub static REQUIRE_INIT_DATA: Lazy<bool> = Lazy::new(|| env_flag("API_REQUIRE_INIT_DATA", false));

    /// Maximum age of Telegram init data (24 hours)
    pub const INIT_DATA_MAX_AGE_SECS: i64 = 86_400;
}

/// Bookkeeping limits
pub mod limits {
    /// Identical transactions recorded closer than this are treated as a double tap
    pub const DUPLICATE_WINDOW_SECS: i64 = 5;

    /// Transactions embedded into the menu button and `/start` URLs (keeps the URL under ~2KB)
    pub const MENU_SNAPSHOT_TRANSACTIONS: usize = 10;

    /// Transactions embedded when the user opens the app from the keyboard
    pub const DEFAULT_SNAPSHOT_TRANSACTIONS: usize = 15;

    /// Entries shown by the history view
    pub const HISTORY_ITEMS: usize = 5;

    /// Expense categories listed in the monthly report
    pub const TOP_EXPENSES: usize = 5;
}

/// Category resolution and budget thresholds
pub mod matching {
    /// Minimum similarity (0..1) for a typed category to match an existing one
    pub const FUZZY_CUTOFF: f64 = 0.6;

    /// Share of a budget after which the status turns orange
    pub const BUDGET_WARN_RATIO: f64 = 0.8;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum number of retries for dispatcher reconnection
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher retry attempts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    /// Dispatcher retry delay duration
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }

    /// Base for exponential backoff calculation
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;
}
