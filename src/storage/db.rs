use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;

use crate::core::error::AppResult;
use crate::storage::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Format of every timestamp stored in the database (`date`, `created_at`, ...)
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and applies the embedded
/// migrations on the first connection.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Example
///
/// ```no_run
/// use fingoal::storage::create_pool;
///
/// let pool = create_pool("finance_pro.db")?;
/// # Ok::<(), fingoal::core::AppError>(())
/// ```
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(|c| c.busy_timeout(Duration::from_secs(5)));
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    let mut conn = pool.get()?;
    migrations::run_migrations(&mut conn).map_err(|e| crate::core::AppError::Migration(format!("{:#}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}
