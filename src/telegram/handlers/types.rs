//! Handler types, dependencies, and user registration helpers

use std::sync::Arc;

use teloxide::types::Message;

use crate::conversation::{ConversationStore, FlowContext, Outcome};
use crate::core::error::AppResult;
use crate::storage::{get_connection, users, DbPool};

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub store: ConversationStore,
    /// Base URL of the Mini App
    pub webapp_url: Arc<str>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<DbPool>, store: ConversationStore, webapp_url: impl Into<String>) -> Self {
        Self {
            db_pool,
            store,
            webapp_url: Arc::from(webapp_url.into()),
        }
    }

    /// Runs a flow for `user_id` on a pooled connection.
    ///
    /// The connection is released before the caller awaits on Telegram.
    pub fn run_flow<F>(&self, user_id: i64, flow: F) -> AppResult<Outcome>
    where
        F: FnOnce(&FlowContext<'_>) -> AppResult<Outcome>,
    {
        let conn = get_connection(&self.db_pool)?;
        let ctx = FlowContext {
            conn: &conn,
            store: &self.store,
            user_id,
            now: chrono::Local::now().naive_local(),
            webapp_url: &self.webapp_url,
        };
        flow(&ctx)
    }
}

/// Sender of a message
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl UserInfo {
    /// Extract user info from a Telegram message (falls back to the chat id)
    pub fn from_message(msg: &Message) -> Self {
        let from = msg.from.as_ref();
        Self {
            user_id: from
                .and_then(|u| i64::try_from(u.id.0).ok())
                .unwrap_or(msg.chat.id.0),
            username: from.and_then(|u| u.username.clone()),
            first_name: from.map(|u| u.first_name.clone()),
        }
    }
}

fn try_register_user(db_pool: &DbPool, user: &UserInfo) -> AppResult<()> {
    let conn = get_connection(db_pool)?;
    users::register_user(
        &conn,
        user.user_id,
        user.username.as_deref(),
        user.first_name.as_deref(),
        chrono::Local::now().naive_local(),
    )?;
    Ok(())
}

/// Records the user (or refreshes `last_seen_at`). Failures are logged and never block the update.
pub fn register_user(db_pool: &DbPool, user: &UserInfo) {
    if let Err(e) = try_register_user(db_pool, user) {
        log::error!("Failed to register user {}: {}", user.user_id, e);
    }
}
