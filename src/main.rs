use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use fingoal::cli::{Cli, Commands};
use fingoal::conversation::ConversationStore;
use fingoal::core::{config, init_logger, log_startup_configuration};
use fingoal::finance::{deeplink, snapshot};
use fingoal::storage::{create_pool, get_connection};
use fingoal::telegram::{create_bot, run_api_server, schema, setup_bot_commands, ApiState, HandlerDeps};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from the dispatcher instead of losing them on stderr
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env must be loaded before any config static is touched
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run) | None => run_bot().await,
        Some(Commands::Migrate) => run_migrate(),
        Some(Commands::Snapshot { user, limit }) => run_snapshot(user, limit),
        Some(Commands::Deeplink { raw }) => {
            println!("{}", deeplink::encode(&raw));
            Ok(())
        }
    }
}

fn run_migrate() -> Result<()> {
    create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    log::info!("Database {} is up to date", *config::DATABASE_PATH);
    Ok(())
}

fn run_snapshot(user_id: i64, limit: usize) -> Result<()> {
    let db_pool =
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let conn = get_connection(&db_pool)?;
    let now = chrono::Local::now().naive_local();

    let snap = snapshot::build_snapshot(&conn, user_id, limit, now)?;
    println!("{}", serde_json::to_string_pretty(&snap)?);
    println!(
        "{}",
        snapshot::snapshot_url(&conn, &config::WEB_APP_URL, user_id, limit, now, None)?
    );
    Ok(())
}

/// Runs the bot with long polling and, when enabled, the HTTP API
async fn run_bot() -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("Starting bot...");
    log_startup_configuration();

    let bot = create_bot()?;

    match bot.get_me().await {
        Ok(me) => log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id),
        Err(e) => log::warn!("Failed to fetch bot info: {}", e),
    }

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    if *config::api::ENABLED {
        let state = ApiState {
            db_pool: Arc::clone(&db_pool),
            bot: Some(bot.clone()),
            bot_token: config::BOT_TOKEN.clone(),
            require_init_data: *config::api::REQUIRE_INIT_DATA,
            webapp_url: config::WEB_APP_URL.clone(),
        };
        let addr = format!("{}:{}", *config::api::BIND_ADDR, *config::api::PORT);
        tokio::spawn(async move {
            if let Err(e) = run_api_server(&addr, state).await {
                log::error!("API server error: {}", e);
            }
        });
    }

    let handler_deps = HandlerDeps::new(db_pool, ConversationStore::new(), config::WEB_APP_URL.as_str());
    let handler = schema(handler_deps);

    log::info!("================================================");
    log::info!(
        "🎉 Bot initialization complete in {:.2}s",
        bot_init_start.elapsed().as_secs_f64()
    );
    log::info!("📡 Ready to receive updates!");
    log::info!("================================================");

    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;
    let mut retry_count = 0;

    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // A panic inside the dispatcher surfaces through the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count < max_retries {
                    retry_count += 1;
                    log::info!(
                        "Retrying dispatcher after panic (attempt {}/{})...",
                        retry_count,
                        max_retries
                    );
                    exponential_backoff(retry_count).await;
                } else {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }

        sleep(config::retry::dispatcher_delay()).await;
    }

    Ok(())
}

async fn exponential_backoff(retry_count: u32) {
    let delay = Duration::from_secs(config::retry::EXPONENTIAL_BACKOFF_BASE.pow(retry_count));
    sleep(delay).await;
}
