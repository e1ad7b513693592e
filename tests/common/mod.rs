//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use fingoal::conversation::{ConversationStore, FlowContext, Outcome};
use fingoal::core::AppResult;
use fingoal::storage::{create_pool, get_connection, DbConnection, DbPool};
use tempfile::TempDir;

pub const APP_URL: &str = "https://example.org/money_app/";
pub const USER_ID: i64 = 123456789;

/// File-backed database with migrations applied, removed on drop
pub struct TestDb {
    _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub store: ConversationStore,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fingoal_test.db");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        Self {
            _dir: dir,
            pool: Arc::new(pool),
            store: ConversationStore::new(),
        }
    }

    pub fn conn(&self) -> DbConnection {
        get_connection(&self.pool).unwrap()
    }

    /// Runs a flow for [`USER_ID`] at `now`
    pub fn flow<F>(&self, now: NaiveDateTime, f: F) -> Outcome
    where
        F: FnOnce(&FlowContext<'_>) -> AppResult<Outcome>,
    {
        let conn = self.conn();
        let ctx = FlowContext {
            conn: &conn,
            store: &self.store,
            user_id: USER_ID,
            now,
            webapp_url: APP_URL,
        };
        f(&ctx).unwrap()
    }

    pub fn text(&self, now: NaiveDateTime, text: &str) -> Outcome {
        self.flow(now, |ctx| ctx.handle_text(text))
    }

    pub fn press(&self, now: NaiveDateTime, data: &str) -> Outcome {
        self.flow(now, |ctx| ctx.handle_callback(data))
    }
}

/// 2026-10-`day` 12:`minute`:00
pub fn at(day: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, day)
        .unwrap()
        .and_hms_opt(12, minute, 0)
        .unwrap()
}

/// Callback data of every inline button in the first reply
pub fn callback_data(outcome: &Outcome) -> Vec<String> {
    outcome
        .replies
        .first()
        .and_then(|reply| reply.keyboard.as_ref())
        .map(|kb| kb.inline_buttons().filter_map(|b| b.callback_data()).map(str::to_string).collect())
        .unwrap_or_default()
}
