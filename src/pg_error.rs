//! Postgres SQLSTATE extraction.

use std::error::Error as StdError;

use sqlx::postgres::PgDatabaseError;

/// SQLSTATE codes that callers commonly branch on.
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>.
pub mod codes {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    pub const READ_ONLY_SQL_TRANSACTION: &str = "25006";
    pub const UNDEFINED_TABLE: &str = "42P01";
    pub const QUERY_CANCELED: &str = "57014";
}

/// Returns the SQLSTATE code of the first Postgres error found in `err` or
/// its chain of sources.
pub fn pg_err_code(err: &(dyn StdError + 'static)) -> Option<String> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(code) = code_of(err) {
            return Some(code);
        }
        current = err.source();
    }
    None
}

fn code_of(err: &(dyn StdError + 'static)) -> Option<String> {
    if let Some(pg) = err.downcast_ref::<PgDatabaseError>() {
        return Some(pg.code().to_string());
    }

    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.try_downcast_ref::<PgDatabaseError>())
        .map(|pg| pg.code().to_string())
}
