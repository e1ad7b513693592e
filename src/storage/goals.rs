//! Savings goals

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::storage::db::DATE_FORMAT;

/// A savings goal
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// 0 means "no target yet" (goal created implicitly by a top-up)
    pub target_amount: f64,
    pub current_amount: f64,
    pub status: String,
    pub created_at: Option<String>,
}

impl Goal {
    /// Progress in percent, capped at 100. A goal without target reports 0.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }
}

const GOAL_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, status, created_at";

fn goal_from_row(row: &Row<'_>) -> Result<Goal> {
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Создает цель и возвращает её id.
pub fn create_goal(
    conn: &Connection,
    user_id: i64,
    name: &str,
    target_amount: f64,
    current_amount: f64,
    now: NaiveDateTime,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO goals (user_id, name, target_amount, current_amount, status, created_at)
         VALUES (?1, ?2, ?3, ?4, 'active', ?5)",
        params![
            user_id,
            name,
            target_amount,
            current_amount,
            now.format(DATE_FORMAT).to_string()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Активные цели пользователя в порядке создания.
pub fn list_goals(conn: &Connection, user_id: i64) -> Result<Vec<Goal>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM goals WHERE user_id = ?1 AND status = 'active' ORDER BY id",
        GOAL_COLUMNS
    ))?;
    let rows = stmt.query_map(params![user_id], goal_from_row)?;
    rows.collect()
}

pub fn get_goal(conn: &Connection, user_id: i64, goal_id: i64) -> Result<Option<Goal>> {
    conn.query_row(
        &format!("SELECT {} FROM goals WHERE user_id = ?1 AND id = ?2", GOAL_COLUMNS),
        params![user_id, goal_id],
        goal_from_row,
    )
    .optional()
}

/// Первая цель, в названии которой встречается `fragment` (SQL `LIKE %fragment%`).
pub fn find_goal_like(conn: &Connection, user_id: i64, fragment: &str) -> Result<Option<Goal>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM goals WHERE user_id = ?1 AND name LIKE ?2 ORDER BY id LIMIT 1",
            GOAL_COLUMNS
        ),
        params![user_id, format!("%{}%", fragment)],
        goal_from_row,
    )
    .optional()
}

/// Пополняет цель. Возвращает `false`, если цель не найдена у этого пользователя.
pub fn top_up_goal(conn: &Connection, user_id: i64, goal_id: i64, amount: f64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE goals SET current_amount = current_amount + ?1 WHERE id = ?2 AND user_id = ?3",
        params![amount, goal_id, user_id],
    )?;
    Ok(changed > 0)
}

/// Устанавливает накопленную сумму цели.
pub fn set_goal_amount(conn: &Connection, user_id: i64, goal_id: i64, current_amount: f64) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE goals SET current_amount = ?1 WHERE id = ?2 AND user_id = ?3",
        params![current_amount, goal_id, user_id],
    )?;
    Ok(changed > 0)
}

/// Удаляет цель владельца. Чужие цели не трогает.
pub fn delete_goal(conn: &Connection, user_id: i64, goal_id: i64) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM goals WHERE id = ?1 AND user_id = ?2",
        params![goal_id, user_id],
    )?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations::open_in_memory_for_test;

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2026, 10, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_create_and_top_up() {
        let conn = open_in_memory_for_test().unwrap();
        let id = create_goal(&conn, 7, "Отпуск", 100_000.0, 0.0, now()).unwrap();
        assert!(top_up_goal(&conn, 7, id, 2500.0).unwrap());
        assert!(top_up_goal(&conn, 7, id, 500.0).unwrap());

        let goal = get_goal(&conn, 7, id).unwrap().unwrap();
        assert_eq!(goal.current_amount, 3000.0);
        assert_eq!(goal.status, "active");
        assert_eq!(goal.created_at.as_deref(), Some("2026-10-01 12:00:00"));
    }

    #[test]
    fn test_find_goal_like_matches_substring() {
        let conn = open_in_memory_for_test().unwrap();
        create_goal(&conn, 7, "Новый ноутбук", 80_000.0, 0.0, now()).unwrap();
        assert!(find_goal_like(&conn, 7, "ноут").unwrap().is_some());
        assert!(find_goal_like(&conn, 7, "машина").unwrap().is_none());
        assert!(find_goal_like(&conn, 8, "ноут").unwrap().is_none());
    }

    #[test]
    fn test_delete_goal_scoped_to_owner() {
        let conn = open_in_memory_for_test().unwrap();
        let id = create_goal(&conn, 7, "Машина", 1.0, 0.0, now()).unwrap();
        assert!(!delete_goal(&conn, 8, id).unwrap());
        assert!(!top_up_goal(&conn, 8, id, 10.0).unwrap());
        assert!(delete_goal(&conn, 7, id).unwrap());
        assert!(list_goals(&conn, 7).unwrap().is_empty());
    }

    #[test]
    fn test_set_goal_amount() {
        let conn = open_in_memory_for_test().unwrap();
        let id = create_goal(&conn, 7, "Подушка", 10.0, 3.0, now()).unwrap();
        assert!(set_goal_amount(&conn, 7, id, 9.0).unwrap());
        assert_eq!(list_goals(&conn, 7).unwrap()[0].current_amount, 9.0);
    }

    #[test]
    fn test_progress_percent_capped() {
        let mut goal = Goal {
            id: 1,
            user_id: 1,
            name: "x".into(),
            target_amount: 100.0,
            current_amount: 250.0,
            status: "active".into(),
            created_at: None,
        };
        assert_eq!(goal.progress_percent(), 100.0);
        goal.current_amount = 25.0;
        assert_eq!(goal.progress_percent(), 25.0);
        goal.target_amount = 0.0;
        assert_eq!(goal.progress_percent(), 0.0);
    }
}
