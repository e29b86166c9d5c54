/// Shared infrastructure concerns
///
/// Connection pooling and migrations used by every persistence adapter.
pub mod database;

pub use database::{Database, DbConnection, DbPool, PoolStatus};
