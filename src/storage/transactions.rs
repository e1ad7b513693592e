//! Income and expense records

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::core::config;
use crate::core::types::TxKind;
use crate::storage::db::DATE_FORMAT;

/// A single income or expense record
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub category: String,
    pub kind: TxKind,
    /// `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    pub description: Option<String>,
}

/// Result of [`save_transaction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Row inserted, carries the new id
    Saved(i64),
    /// Same amount/category/type was recorded moments ago, nothing inserted
    Duplicate,
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

/// Income and expense sums
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub income: f64,
    pub expense: f64,
}

impl Totals {
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

/// Сохраняет транзакцию с защитой от двойного нажатия.
///
/// Если последняя транзакция пользователя с той же суммой, категорией и типом
/// записана менее чем за 5 секунд до `now`, вставка пропускается.
/// Дата, которую не удалось разобрать, вставку не блокирует.
pub fn save_transaction(
    conn: &Connection,
    user_id: i64,
    amount: f64,
    category: &str,
    kind: TxKind,
    description: Option<&str>,
    now: NaiveDateTime,
) -> Result<SaveOutcome> {
    let last_date: Option<String> = conn
        .query_row(
            "SELECT date FROM transactions
             WHERE user_id = ?1 AND amount = ?2 AND category = ?3 AND type = ?4
             ORDER BY id DESC LIMIT 1",
            params![user_id, amount, category, kind],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(last) = last_date.and_then(|d| NaiveDateTime::parse_from_str(&d, DATE_FORMAT).ok()) {
        let elapsed = now.signed_duration_since(last);
        if elapsed < chrono::Duration::seconds(config::limits::DUPLICATE_WINDOW_SECS) {
            log::info!(
                "Duplicate transaction skipped for user {}: {} {} ({})",
                user_id,
                amount,
                category,
                kind
            );
            return Ok(SaveOutcome::Duplicate);
        }
    }

    conn.execute(
        "INSERT INTO transactions (user_id, amount, category, type, date, description)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            amount,
            category,
            kind,
            now.format(DATE_FORMAT).to_string(),
            description
        ],
    )?;
    Ok(SaveOutcome::Saved(conn.last_insert_rowid()))
}

/// Последние транзакции пользователя, новые первыми.
pub fn recent_transactions(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, amount, category, type, date, description FROM transactions
         WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![user_id, limit as i64], |row| {
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
            kind: row.get(4)?,
            date: row.get(5)?,
            description: row.get(6)?,
        })
    })?;
    rows.collect()
}

fn collect_totals(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Totals> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok((row.get::<_, TxKind>(0)?, row.get::<_, f64>(1)?)))?;

    let mut totals = Totals::default();
    for row in rows {
        match row? {
            (TxKind::Income, sum) => totals.income = sum,
            (TxKind::Expense, sum) => totals.expense = sum,
        }
    }
    Ok(totals)
}

/// Суммы доходов и расходов за всё время.
pub fn lifetime_totals(conn: &Connection, user_id: i64) -> Result<Totals> {
    collect_totals(
        conn,
        "SELECT type, COALESCE(SUM(amount), 0) FROM transactions WHERE user_id = ?1 GROUP BY type",
        &[&user_id],
    )
}

/// Суммы доходов и расходов за период `start <= date < end`; без `end` до текущего момента.
pub fn totals_between(conn: &Connection, user_id: i64, start: &str, end: Option<&str>) -> Result<Totals> {
    collect_totals(
        conn,
        "SELECT type, COALESCE(SUM(amount), 0) FROM transactions
         WHERE user_id = ?1 AND date >= ?2 AND (?3 IS NULL OR date < ?3)
         GROUP BY type",
        &[&user_id, &start, &end],
    )
}

/// Расходы по категориям за период, самые крупные первыми.
pub fn expenses_by_category(
    conn: &Connection,
    user_id: i64,
    start: &str,
    end: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<(String, f64)>> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT category, SUM(amount) AS total FROM transactions
         WHERE user_id = ?1 AND type = 'expense' AND date >= ?2 AND (?3 IS NULL OR date < ?3)
         GROUP BY category ORDER BY total DESC, category ASC LIMIT ?4",
    )?;
    let rows = stmt.query_map(params![user_id, start, end, limit], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

/// Суммы по паре (категория, тип) начиная с `start`.
pub fn sums_by_category_and_kind(conn: &Connection, user_id: i64, start: &str) -> Result<Vec<(String, TxKind, f64)>> {
    let mut stmt = conn.prepare(
        "SELECT category, type, SUM(amount) FROM transactions
         WHERE user_id = ?1 AND date >= ?2
         GROUP BY category, type",
    )?;
    let rows = stmt.query_map(params![user_id, start], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
    rows.collect()
}

/// Потрачено в категории начиная с `start` (включая только что записанную транзакцию).
pub fn spent_in_category(conn: &Connection, user_id: i64, category: &str, start: &str) -> Result<f64> {
    conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM transactions
         WHERE user_id = ?1 AND category = ?2 AND type = 'expense' AND date >= ?3",
        params![user_id, category, start],
        |row| row.get(0),
    )
}

/// Названия категорий, встречающиеся в транзакциях пользователя.
pub fn transaction_categories(conn: &Connection, user_id: i64, kind: Option<TxKind>) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM transactions
         WHERE user_id = ?1 AND (?2 IS NULL OR type = ?2)
         ORDER BY category",
    )?;
    let rows = stmt.query_map(params![user_id, kind], |row| row.get(0))?;
    rows.collect()
}

pub fn delete_transactions_in_category(conn: &Connection, user_id: i64, category: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM transactions WHERE user_id = ?1 AND category = ?2",
        params![user_id, category],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::open_in_memory_for_test;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_duplicate_within_window_is_skipped() {
        let conn = open_in_memory_for_test().unwrap();
        let first = save_transaction(&conn, 1, 500.0, "Еда", TxKind::Expense, None, at(12, 0, 0)).unwrap();
        assert!(first.is_saved());

        let second = save_transaction(&conn, 1, 500.0, "Еда", TxKind::Expense, None, at(12, 0, 3)).unwrap();
        assert_eq!(second, SaveOutcome::Duplicate);

        let third = save_transaction(&conn, 1, 500.0, "Еда", TxKind::Expense, None, at(12, 0, 6)).unwrap();
        assert!(third.is_saved());
        assert_eq!(recent_transactions(&conn, 1, 10).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_guard_keys_on_all_fields() {
        let conn = open_in_memory_for_test().unwrap();
        let now = at(9, 0, 0);
        save_transaction(&conn, 1, 500.0, "Еда", TxKind::Expense, None, now).unwrap();
        assert!(save_transaction(&conn, 1, 501.0, "Еда", TxKind::Expense, None, now).unwrap().is_saved());
        assert!(save_transaction(&conn, 1, 500.0, "Такси", TxKind::Expense, None, now).unwrap().is_saved());
        assert!(save_transaction(&conn, 1, 500.0, "Еда", TxKind::Income, None, now).unwrap().is_saved());
        assert!(save_transaction(&conn, 2, 500.0, "Еда", TxKind::Expense, None, now).unwrap().is_saved());
    }

    #[test]
    fn test_unparseable_date_does_not_block() {
        let conn = open_in_memory_for_test().unwrap();
        conn.execute(
            "INSERT INTO transactions (user_id, amount, category, type, date) VALUES (1, 10, 'Кофе', 'expense', 'garbage')",
            [],
        )
        .unwrap();
        let outcome = save_transaction(&conn, 1, 10.0, "Кофе", TxKind::Expense, None, at(8, 0, 0)).unwrap();
        assert!(outcome.is_saved());
    }

    #[test]
    fn test_totals_and_period_filters() {
        let conn = open_in_memory_for_test().unwrap();
        save_transaction(&conn, 1, 1000.0, "Зарплата", TxKind::Income, None, at(10, 0, 0)).unwrap();
        save_transaction(&conn, 1, 200.0, "Еда", TxKind::Expense, Some("обед"), at(11, 0, 0)).unwrap();
        conn.execute(
            "INSERT INTO transactions (user_id, amount, category, type, date) VALUES (1, 50, 'Еда', 'expense', '2026-09-30 23:59:59')",
            [],
        )
        .unwrap();

        let all = lifetime_totals(&conn, 1).unwrap();
        assert_eq!(all.income, 1000.0);
        assert_eq!(all.expense, 250.0);
        assert_eq!(all.net(), 750.0);

        let october = totals_between(&conn, 1, "2026-10-01", Some("2026-11-01")).unwrap();
        assert_eq!(october.expense, 200.0);

        let september = totals_between(&conn, 1, "2026-09-01", Some("2026-10-01")).unwrap();
        assert_eq!(september, Totals { income: 0.0, expense: 50.0 });

        assert_eq!(spent_in_category(&conn, 1, "Еда", "2026-10-01").unwrap(), 200.0);
    }

    #[test]
    fn test_expenses_by_category_sorted_and_limited() {
        let conn = open_in_memory_for_test().unwrap();
        save_transaction(&conn, 1, 100.0, "Кофе", TxKind::Expense, None, at(10, 0, 0)).unwrap();
        save_transaction(&conn, 1, 300.0, "Еда", TxKind::Expense, None, at(10, 1, 0)).unwrap();
        save_transaction(&conn, 1, 50.0, "Такси", TxKind::Expense, None, at(10, 2, 0)).unwrap();
        save_transaction(&conn, 1, 999.0, "Зарплата", TxKind::Income, None, at(10, 3, 0)).unwrap();

        let top = expenses_by_category(&conn, 1, "2026-10-01", None, Some(2)).unwrap();
        assert_eq!(top, vec![("Еда".to_string(), 300.0), ("Кофе".to_string(), 100.0)]);

        let every = expenses_by_category(&conn, 1, "2026-10-01", None, None).unwrap();
        assert_eq!(every.len(), 3);
    }

    #[test]
    fn test_categories_and_delete() {
        let conn = open_in_memory_for_test().unwrap();
        save_transaction(&conn, 1, 100.0, "Кофе", TxKind::Expense, None, at(10, 0, 0)).unwrap();
        save_transaction(&conn, 1, 100.0, "Бонус", TxKind::Income, None, at(10, 0, 0)).unwrap();

        assert_eq!(transaction_categories(&conn, 1, None).unwrap(), vec!["Бонус", "Кофе"]);
        assert_eq!(transaction_categories(&conn, 1, Some(TxKind::Expense)).unwrap(), vec!["Кофе"]);

        assert_eq!(delete_transactions_in_category(&conn, 1, "Кофе").unwrap(), 1);
        assert_eq!(recent_transactions(&conn, 1, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_transactions_newest_first() {
        let conn = open_in_memory_for_test().unwrap();
        save_transaction(&conn, 1, 1.0, "a", TxKind::Expense, None, at(10, 0, 0)).unwrap();
        save_transaction(&conn, 1, 2.0, "b", TxKind::Expense, Some("desc"), at(10, 0, 1)).unwrap();

        let recent = recent_transactions(&conn, 1, 1).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].category, "b");
        assert_eq!(recent[0].description.as_deref(), Some("desc"));
        assert_eq!(recent[0].date, "2026-10-15 10:00:01");
    }
}
