//! Free-text entry grammar
//!
//! - `!1000 Отпуск` top-up of a goal
//! - `+5000 ЗП премия` income, first word is the category
//! - `1000 Еда обед` expense, first word is the category

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::types::TxKind;

static GOAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!([0-9]+(?:[.,][0-9]+)?)\s+(.+)").expect("Failed to compile goal regex"));
static INCOME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+([0-9]+(?:[.,][0-9]+)?)\s+(.+)").expect("Failed to compile income regex"));
static EXPENSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(?:[.,][0-9]+)?)\s+(.+)").expect("Failed to compile expense regex"));

/// A transaction typed by the user, category not yet resolved
#[derive(Debug, Clone, PartialEq)]
pub struct TxDraft {
    pub amount: f64,
    /// Category exactly as typed
    pub category: String,
    pub kind: TxKind,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    GoalTopUp { amount: f64, goal_name: String },
    Transaction(TxDraft),
}

/// Parses a chat message. Returns `None` for anything that is not an entry.
pub fn parse_entry(text: &str) -> Option<Entry> {
    let text = text.trim();

    if let Some(caps) = GOAL_RE.captures(text) {
        let amount = parse_amount(&caps[1])?;
        let goal_name = caps[2].trim().to_string();
        return Some(Entry::GoalTopUp { amount, goal_name });
    }

    let (kind, caps) = if let Some(caps) = INCOME_RE.captures(text) {
        (TxKind::Income, caps)
    } else {
        (TxKind::Expense, EXPENSE_RE.captures(text)?)
    };

    let amount = parse_amount(&caps[1])?;
    let rest = caps[2].trim();
    let (category, description) = match rest.split_once(char::is_whitespace) {
        Some((category, description)) => (category, Some(description.trim().to_string())),
        None => (rest, None),
    };

    Some(Entry::Transaction(TxDraft {
        amount,
        category: category.to_string(),
        kind,
        description: description.filter(|d| !d.is_empty()),
    }))
}

/// Parses a user-supplied amount: spaces ignored, `,` or `.` as decimal separator.
///
/// Only finite, strictly positive values are accepted.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    is_valid_amount(value).then_some(value)
}

pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
