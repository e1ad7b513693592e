use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies pending schema migrations.
///
/// Runs under a process-wide mutex and an exclusive SQLite lock so a second
/// bot instance started against the same file waits instead of interleaving.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    // Migrations are idempotent, a poisoned lock is safe to reuse
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    conn.busy_timeout(Duration::from_secs(30))
        .context("set SQLite busy timeout")?;
    conn.execute_batch("BEGIN IMMEDIATE")
        .context("acquire migration lock")?;

    match embedded::migrations::runner().run(conn) {
        Ok(report) => {
            conn.execute_batch("COMMIT").context("commit migrations")?;
            for migration in report.applied_migrations() {
                log::info!("Applied migration {}", migration);
            }
            Ok(())
        }
        Err(err) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(err).context("apply migrations")
        }
    }
}

/// Run migrations for tests without the outer transaction wrapper
#[doc(hidden)]
pub fn run_migrations_for_test(conn: &mut Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(30))
        .context("set SQLite busy timeout")?;

    embedded::migrations::runner()
        .run(conn)
        .map(|_| ())
        .context("apply migrations")
}

/// Opens an in-memory database with the full schema applied
#[doc(hidden)]
pub fn open_in_memory_for_test() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory database")?;
    run_migrations_for_test(&mut conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_uniqueness_enforced_by_schema() {
        let conn = open_in_memory_for_test().unwrap();
        conn.execute(
            "INSERT INTO budgets (user_id, category_name, amount, month_year) VALUES (1, 'Еда', 100, '2026-10')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO budgets (user_id, category_name, amount, month_year) VALUES (1, 'Еда', 200, '2026-10')",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn test_transaction_type_is_checked() {
        let conn = open_in_memory_for_test().unwrap();
        let bad = conn.execute(
            "INSERT INTO transactions (user_id, amount, category, type, date) VALUES (1, 5, 'x', 'transfer', '2026-10-01 00:00:00')",
            [],
        );
        assert!(bad.is_err());
    }
}
