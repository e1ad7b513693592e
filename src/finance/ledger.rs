//! Write operations shared by chat input, deep links, the Mini App and the HTTP API

use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::core::error::{AppError, AppResult};
use crate::core::types::TxKind;
use crate::finance::budget;
use crate::finance::parser::is_valid_amount;
use crate::finance::period::Month;
use crate::storage::{budgets, goals, transactions, Goal, SaveOutcome};

/// Result of [`record_transaction`]
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub outcome: SaveOutcome,
    /// Alarm line when this expense pushed the category over its monthly budget
    pub budget_warning: Option<&'static str>,
}

impl Recorded {
    pub fn is_saved(&self) -> bool {
        self.outcome.is_saved()
    }
}

pub(crate) fn ensure_amount(amount: f64) -> AppResult<()> {
    if is_valid_amount(amount) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("amount must be a positive number, got {}", amount)))
    }
}

fn ensure_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(name)
}

/// Saves a transaction (with the double-tap guard) and runs the budget check for expenses.
pub fn record_transaction(
    conn: &Connection,
    user_id: i64,
    amount: f64,
    category: &str,
    kind: TxKind,
    description: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<Recorded> {
    ensure_amount(amount)?;
    let category = ensure_name(category)?;
    let description = description.map(str::trim).filter(|d| !d.is_empty());

    let outcome = transactions::save_transaction(conn, user_id, amount, category, kind, description, now)?;
    let budget_warning = if outcome.is_saved() && kind.is_expense() {
        budget::budget_warning(conn, user_id, category, amount, now)?
    } else {
        None
    };

    Ok(Recorded {
        outcome,
        budget_warning,
    })
}

/// Outcome of a top-up by goal name
#[derive(Debug, Clone, PartialEq)]
pub enum GoalTopUp {
    /// An existing goal matched; amounts before and after
    Existing { goal: Goal, before: f64, after: f64 },
    /// No goal matched, a new one was started with the amount as its balance
    Created { goal_id: i64 },
}

/// Tops up the first goal whose name contains `name`, or starts a new goal.
pub fn top_up_goal_by_name(
    conn: &Connection,
    user_id: i64,
    name: &str,
    amount: f64,
    now: NaiveDateTime,
) -> AppResult<GoalTopUp> {
    ensure_amount(amount)?;
    let name = ensure_name(name)?;

    match goals::find_goal_like(conn, user_id, name)? {
        Some(goal) => {
            goals::top_up_goal(conn, user_id, goal.id, amount)?;
            let before = goal.current_amount;
            Ok(GoalTopUp::Existing {
                before,
                after: before + amount,
                goal,
            })
        }
        None => {
            let goal_id = goals::create_goal(conn, user_id, name, 0.0, amount, now)?;
            Ok(GoalTopUp::Created { goal_id })
        }
    }
}

/// Tops up a goal by id. Returns `false` when the user has no such goal.
pub fn top_up_goal_by_id(conn: &Connection, user_id: i64, goal_id: i64, amount: f64) -> AppResult<bool> {
    ensure_amount(amount)?;
    Ok(goals::top_up_goal(conn, user_id, goal_id, amount)?)
}

pub fn create_goal(conn: &Connection, user_id: i64, name: &str, target: f64, now: NaiveDateTime) -> AppResult<i64> {
    ensure_amount(target)?;
    let name = ensure_name(name)?;
    Ok(goals::create_goal(conn, user_id, name, target, 0.0, now)?)
}

/// Sets the limit of `category` for the month of `now`
pub fn set_monthly_budget(
    conn: &Connection,
    user_id: i64,
    category: &str,
    limit: f64,
    now: NaiveDateTime,
) -> AppResult<()> {
    ensure_amount(limit)?;
    let category = ensure_name(category)?;
    budgets::set_budget(conn, user_id, category, limit, &Month::of(now).key())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::open_in_memory_for_test;

    fn at(day: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 10, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_record_transaction_rejects_bad_amounts() {
        let conn = open_in_memory_for_test().unwrap();
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = record_transaction(&conn, 1, bad, "Еда", TxKind::Expense, None, at(1)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(record_transaction(&conn, 1, 10.0, "  ", TxKind::Expense, None, at(1)).is_err());
        assert!(transactions::recent_transactions(&conn, 1, 10).unwrap().is_empty());
    }

    #[test]
    fn test_record_transaction_reports_crossing() {
        let conn = open_in_memory_for_test().unwrap();
        set_monthly_budget(&conn, 1, "Еда", 100.0, at(1)).unwrap();

        let first = record_transaction(&conn, 1, 90.0, "Еда", TxKind::Expense, Some(" "), at(1)).unwrap();
        assert!(first.is_saved());
        assert_eq!(first.budget_warning, None);

        let second = record_transaction(&conn, 1, 20.0, "Еда", TxKind::Expense, None, at(2)).unwrap();
        assert!(second.budget_warning.is_some());

        // income never triggers the budget check
        let income = record_transaction(&conn, 1, 500.0, "Еда", TxKind::Income, None, at(3)).unwrap();
        assert_eq!(income.budget_warning, None);

        let stored = transactions::recent_transactions(&conn, 1, 10).unwrap();
        assert_eq!(stored[2].description, None);
    }

    #[test]
    fn test_duplicate_skips_budget_check() {
        let conn = open_in_memory_for_test().unwrap();
        set_monthly_budget(&conn, 1, "Еда", 100.0, at(1)).unwrap();
        record_transaction(&conn, 1, 150.0, "Еда", TxKind::Expense, None, at(1)).unwrap();
        let dup = record_transaction(&conn, 1, 150.0, "Еда", TxKind::Expense, None, at(1)).unwrap();
        assert_eq!(dup.outcome, SaveOutcome::Duplicate);
        assert_eq!(dup.budget_warning, None);
    }

    #[test]
    fn test_top_up_by_name_existing_and_new() {
        let conn = open_in_memory_for_test().unwrap();
        let id = create_goal(&conn, 1, "Отпуск в Сочи", 50_000.0, at(1)).unwrap();
        goals::set_goal_amount(&conn, 1, id, 1000.0).unwrap();

        match top_up_goal_by_name(&conn, 1, "Отпуск", 500.0, at(2)).unwrap() {
            GoalTopUp::Existing { goal, before, after } => {
                assert_eq!(goal.id, id);
                assert_eq!(before, 1000.0);
                assert_eq!(after, 1500.0);
            }
            other => panic!("unexpected {:?}", other),
        }

        let created = top_up_goal_by_name(&conn, 1, "Машина", 300.0, at(2)).unwrap();
        let GoalTopUp::Created { goal_id } = created else {
            panic!("expected a new goal");
        };
        let goal = goals::get_goal(&conn, 1, goal_id).unwrap().unwrap();
        assert_eq!(goal.target_amount, 0.0);
        assert_eq!(goal.current_amount, 300.0);
    }

    #[test]
    fn test_top_up_by_id_requires_ownership() {
        let conn = open_in_memory_for_test().unwrap();
        let id = create_goal(&conn, 1, "Ноутбук", 1000.0, at(1)).unwrap();
        assert!(top_up_goal_by_id(&conn, 1, id, 100.0).unwrap());
        assert!(!top_up_goal_by_id(&conn, 2, id, 100.0).unwrap());
        assert!(top_up_goal_by_id(&conn, 1, id, -1.0).is_err());
    }

    #[test]
    fn test_set_monthly_budget_uses_month_key() {
        let conn = open_in_memory_for_test().unwrap();
        set_monthly_budget(&conn, 1, "Кафе", 3000.0, at(15)).unwrap();
        assert_eq!(budgets::budget_limit(&conn, 1, "Кафе", "2026-10").unwrap(), Some(3000.0));
        assert!(set_monthly_budget(&conn, 1, "Кафе", 0.0, at(15)).is_err());
    }
}
