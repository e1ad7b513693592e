//! User-declared categories

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result};
use std::collections::BTreeSet;

use crate::core::types::TxKind;
use crate::storage::db::DATE_FORMAT;
use crate::storage::transactions;

/// Создает категорию. Возвращает `false`, если такая (имя + тип) уже есть.
pub fn create_category(conn: &Connection, user_id: i64, name: &str, kind: TxKind, now: NaiveDateTime) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO categories (user_id, name, type, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, kind, now.format(DATE_FORMAT).to_string()],
    )?;
    Ok(inserted > 0)
}

/// Объявленные категории пользователя (опционально только одного типа), по алфавиту.
pub fn category_names(conn: &Connection, user_id: i64, kind: Option<TxKind>) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT name FROM categories
         WHERE user_id = ?1 AND (?2 IS NULL OR type = ?2)
         ORDER BY name",
    )?;
    let rows = stmt.query_map(params![user_id, kind], |row| row.get(0))?;
    rows.collect()
}

/// Объединение объявленных категорий и категорий из транзакций, по алфавиту.
pub fn known_category_names(conn: &Connection, user_id: i64, kind: Option<TxKind>) -> Result<Vec<String>> {
    let mut names: BTreeSet<String> = category_names(conn, user_id, kind)?.into_iter().collect();
    names.extend(transactions::transaction_categories(conn, user_id, kind)?);
    Ok(names.into_iter().collect())
}

/// Удаляет категорию вместе со всеми её транзакциями.
///
/// Возвращает количество удаленных транзакций.
pub fn delete_category_everywhere(conn: &Connection, user_id: i64, name: &str) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM categories WHERE user_id = ?1 AND name = ?2",
        params![user_id, name],
    )?;
    let removed = transactions::delete_transactions_in_category(&tx, user_id, name)?;
    tx.commit()?;
    Ok(removed)
}
