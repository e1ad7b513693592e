//! Compact data snapshot embedded into the Mini App URL
//!
//! Short keys keep the base64 blob small enough for a Telegram button URL.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::error::{AppError, AppResult};
use crate::finance::period::Month;
use crate::storage::{budgets, categories, goals, transactions};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTx {
    #[serde(rename = "i")]
    pub id: i64,
    #[serde(rename = "a")]
    pub amount: i64,
    #[serde(rename = "c")]
    pub category: String,
    /// 1 = expense, 0 = income
    #[serde(rename = "t")]
    pub kind: u8,
    /// `MM-DD HH:MM`
    #[serde(rename = "d")]
    pub date: String,
    #[serde(rename = "ds")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotGoal {
    #[serde(rename = "i")]
    pub id: i64,
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "c")]
    pub current: i64,
    #[serde(rename = "t")]
    pub target: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBudget {
    #[serde(rename = "n")]
    pub category: String,
    #[serde(rename = "l")]
    pub limit: i64,
    #[serde(rename = "s")]
    pub spent: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    #[serde(rename = "i")]
    pub income: i64,
    #[serde(rename = "e")]
    pub expense: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tx: Vec<SnapshotTx>,
    pub g: Vec<SnapshotGoal>,
    pub b: Vec<SnapshotBudget>,
    pub c: Vec<String>,
    pub s: SnapshotSummary,
    /// English month name
    pub m: String,
}

/// Monthly figures behind the report charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    pub income: f64,
    pub expense: f64,
    pub categories: BTreeMap<String, f64>,
    /// "October 2026"
    pub month: String,
}

/// `MM-DD HH:MM` slice of a stored `YYYY-MM-DD HH:MM:SS` date
fn short_date(date: &str) -> String {
    date.get(5..16).unwrap_or(date).to_string()
}

/// Collects the user's data for the Mini App: the last `limit` transactions,
/// goals, budgets of the current month, declared categories and month totals.
pub fn build_snapshot(conn: &Connection, user_id: i64, limit: usize, now: NaiveDateTime) -> AppResult<Snapshot> {
    let month = Month::of(now);

    let tx = transactions::recent_transactions(conn, user_id, limit)?
        .into_iter()
        .map(|t| SnapshotTx {
            id: t.id,
            amount: t.amount as i64,
            category: t.category,
            kind: t.kind.snapshot_flag(),
            date: short_date(&t.date),
            description: t.description,
        })
        .collect();

    let g = goals::list_goals(conn, user_id)?
        .into_iter()
        .map(|goal| SnapshotGoal {
            id: goal.id,
            name: goal.name,
            current: goal.current_amount as i64,
            target: goal.target_amount as i64,
        })
        .collect();

    let limits: BTreeMap<String, f64> = budgets::budgets_for_month(conn, user_id, &month.key())?
        .into_iter()
        .map(|b| (b.category_name, b.amount))
        .collect();
    let spent: BTreeMap<String, f64> = transactions::expenses_by_category(conn, user_id, &month.start(), None, None)?
        .into_iter()
        .collect();
    let names: BTreeSet<&String> = limits.keys().chain(spent.keys()).collect();
    let b = names
        .into_iter()
        .map(|name| SnapshotBudget {
            category: name.clone(),
            limit: limits.get(name).copied().unwrap_or(0.0) as i64,
            spent: spent.get(name).copied().unwrap_or(0.0) as i64,
        })
        .filter(|b| b.limit > 0 || b.spent > 0)
        .collect();

    let c = categories::category_names(conn, user_id, None)?;
    let totals = transactions::totals_between(conn, user_id, &month.start(), None)?;

    Ok(Snapshot {
        tx,
        g,
        b,
        c,
        s: SnapshotSummary {
            income: totals.income as i64,
            expense: totals.expense as i64,
        },
        m: month.english_name().to_string(),
    })
}

/// Monthly chart data for the report view
pub fn build_chart_payload(conn: &Connection, user_id: i64, month: Month) -> AppResult<ChartPayload> {
    let end = month.end();
    let totals = transactions::totals_between(conn, user_id, &month.start(), Some(&end))?;
    let categories = transactions::expenses_by_category(conn, user_id, &month.start(), Some(&end), None)?
        .into_iter()
        .collect();

    Ok(ChartPayload {
        income: totals.income,
        expense: totals.expense,
        categories,
        month: month.english_title(),
    })
}

/// URL-safe base64 of the JSON encoding
pub fn encode_payload<T: Serialize>(payload: &T) -> AppResult<String> {
    let json = serde_json::to_string(payload)?;
    Ok(URL_SAFE.encode(json.as_bytes()))
}

/// Inverse of [`encode_payload`]
pub fn decode_payload<T: for<'de> Deserialize<'de>>(data: &str) -> AppResult<T> {
    let bytes = URL_SAFE.decode(data)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Builds `<base>?data=<payload>`, with `&v=<version>` when a cache-buster is given.
pub fn webapp_url(base: &str, data: &str, version: Option<i64>) -> AppResult<String> {
    let mut url = url::Url::parse(base).map_err(|e| AppError::Validation(format!("invalid WEB_APP_URL '{}': {}", base, e)))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("data", data);
        if let Some(v) = version {
            query.append_pair("v", &v.to_string());
        }
    }
    Ok(url.into())
}

/// Snapshot URL ready for a Web App button
pub fn snapshot_url(
    conn: &Connection,
    base: &str,
    user_id: i64,
    limit: usize,
    now: NaiveDateTime,
    version: Option<i64>,
) -> AppResult<String> {
    let snapshot = build_snapshot(conn, user_id, limit, now)?;
    webapp_url(base, &encode_payload(&snapshot)?, version)
}
