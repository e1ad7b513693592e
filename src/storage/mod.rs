//! SQLite persistence: connection pool, migrations and per-table queries

pub mod budgets;
pub mod categories;
pub mod db;
pub mod goals;
pub mod migrations;
pub mod transactions;
pub mod users;

// Re-exports for convenience
pub use budgets::Budget;
pub use db::{create_pool, get_connection, DbConnection, DbPool, DATE_FORMAT};
pub use goals::Goal;
pub use transactions::{SaveOutcome, Totals, Transaction};
pub use users::User;
