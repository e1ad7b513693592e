//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the effective configuration

use anyhow::Result;
use simplelog::*;
use std::fs::OpenOptions;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// The log file is opened in append mode so restarts keep the previous session.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Masks a bot token for logs, keeping the numeric bot id
pub fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, secret)) if !secret.is_empty() => format!("{}:***", id),
        _ if token.is_empty() => "<not set>".to_string(),
        _ => "***".to_string(),
    }
}

/// Logs the effective configuration at application startup
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("💰 FinGoal configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN: not set, the bot cannot start");
    } else {
        log::info!("✅ BOT_TOKEN: {}", mask_token(&config::BOT_TOKEN));
    }

    log::info!("🗄  DATABASE_PATH: {}", *config::DATABASE_PATH);
    log::info!("📱 WEB_APP_URL: {}", *config::WEB_APP_URL);

    if *config::api::ENABLED {
        log::info!(
            "🌐 API: http://{}:{} (init data required: {})",
            *config::api::BIND_ADDR,
            *config::api::PORT,
            *config::api::REQUIRE_INIT_DATA
        );
        if !*config::api::REQUIRE_INIT_DATA {
            log::warn!("⚠️  /api/save accepts unsigned requests; set API_REQUIRE_INIT_DATA=true in production");
        }
    } else {
        log::info!("🌐 API: disabled (API_ENABLED=false)");
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
