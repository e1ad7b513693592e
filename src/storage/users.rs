//! Bot users and account-level operations

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::storage::db::DATE_FORMAT;

/// Структура, представляющая пользователя в базе данных.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Telegram ID пользователя
    pub telegram_id: i64,
    /// Имя пользователя (username) в Telegram, если доступно
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub created_at: String,
    pub last_seen_at: String,
}

/// Регистрирует пользователя или обновляет его имя и время последнего визита.
pub fn register_user(
    conn: &Connection,
    telegram_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let now = now.format(DATE_FORMAT).to_string();
    conn.execute(
        "INSERT INTO users (telegram_id, username, first_name, created_at, last_seen_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(telegram_id) DO UPDATE SET
             username = excluded.username,
             first_name = excluded.first_name,
             last_seen_at = excluded.last_seen_at",
        params![telegram_id, username, first_name, now],
    )?;
    Ok(())
}

/// Получает пользователя по Telegram ID.
pub fn get_user(conn: &Connection, telegram_id: i64) -> Result<Option<User>> {
    conn.query_row(
        "SELECT telegram_id, username, first_name, created_at, last_seen_at FROM users WHERE telegram_id = ?1",
        params![telegram_id],
        |row| {
            Ok(User {
                telegram_id: row.get(0)?,
                username: row.get(1)?,
                first_name: row.get(2)?,
                created_at: row.get(3)?,
                last_seen_at: row.get(4)?,
            })
        },
    )
    .optional()
}

/// Удаляет все финансовые данные пользователя (транзакции, цели, категории, бюджеты).
///
/// Запись в `users` остается.
pub fn reset_user_data(conn: &Connection, user_id: i64) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for table in ["transactions", "goals", "categories", "budgets"] {
        tx.execute(&format!("DELETE FROM {} WHERE user_id = ?1", table), params![user_id])?;
    }
    tx.commit()
}
