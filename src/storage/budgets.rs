//! Monthly spending limits per category

use rusqlite::{params, Connection, OptionalExtension, Result};

/// Limit for one category in one month
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_name: String,
    pub amount: f64,
    /// `YYYY-MM`
    pub month_year: String,
}

/// Устанавливает лимит на месяц. Повторная установка перезаписывает сумму.
pub fn set_budget(conn: &Connection, user_id: i64, category: &str, amount: f64, month_year: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO budgets (user_id, category_name, amount, month_year) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_id, category_name, month_year) DO UPDATE SET amount = excluded.amount",
        params![user_id, category, amount, month_year],
    )?;
    Ok(())
}

pub fn budget_limit(conn: &Connection, user_id: i64, category: &str, month_year: &str) -> Result<Option<f64>> {
    conn.query_row(
        "SELECT amount FROM budgets WHERE user_id = ?1 AND category_name = ?2 AND month_year = ?3",
        params![user_id, category, month_year],
        |row| row.get(0),
    )
    .optional()
}

/// Все лимиты пользователя на месяц, по имени категории.
pub fn budgets_for_month(conn: &Connection, user_id: i64, month_year: &str) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, category_name, amount, month_year FROM budgets
         WHERE user_id = ?1 AND month_year = ?2 ORDER BY category_name",
    )?;
    let rows = stmt.query_map(params![user_id, month_year], |row| {
        Ok(Budget {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category_name: row.get(2)?,
            amount: row.get(3)?,
            month_year: row.get(4)?,
        })
    })?;
    rows.collect()
}
