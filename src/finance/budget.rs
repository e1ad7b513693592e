//! Monthly budget checks

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::core::config;
use crate::core::error::AppResult;
use crate::finance::period::Month;
use crate::finance::quips;
use crate::storage::{budgets, transactions};

/// True only for the transaction that pushes spending over the limit.
///
/// `spent_after` already includes `amount`.
pub fn threshold_crossed(limit: f64, spent_after: f64, amount: f64) -> bool {
    spent_after > limit && spent_after - amount <= limit
}

/// Checks the category budget of the current month after an expense of `amount`
/// has been recorded. Returns an alarm line only at the crossing point.
pub fn budget_warning(
    conn: &Connection,
    user_id: i64,
    category: &str,
    amount: f64,
    now: NaiveDateTime,
) -> AppResult<Option<&'static str>> {
    let month = Month::of(now);
    let Some(limit) = budgets::budget_limit(conn, user_id, category, &month.key())? else {
        return Ok(None);
    };

    let spent = transactions::spent_in_category(conn, user_id, category, &month.start())?;
    if threshold_crossed(limit, spent, amount) {
        log::info!(
            "Budget '{}' exceeded for user {}: {} / {}",
            category,
            user_id,
            spent,
            limit
        );
        return Ok(Some(quips::budget_alarm()));
    }
    Ok(None)
}

/// Traffic-light status of a budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BudgetStatus {
    Within,
    AlmostSpent,
    Exceeded { by: f64 },
}

impl BudgetStatus {
    pub fn evaluate(spent: f64, limit: f64) -> Self {
        let ratio = usage_ratio(spent, limit);
        if ratio > 1.0 {
            BudgetStatus::Exceeded { by: spent - limit }
        } else if ratio > config::matching::BUDGET_WARN_RATIO {
            BudgetStatus::AlmostSpent
        } else {
            BudgetStatus::Within
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            BudgetStatus::Within => "🟢",
            BudgetStatus::AlmostSpent => "🟠",
            BudgetStatus::Exceeded { .. } => "🔴",
        }
    }
}

/// spent / limit, 0 when no positive limit is set
pub fn usage_ratio(spent: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        spent / limit
    } else {
        0.0
    }
}
