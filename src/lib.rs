//! Handyman
//!
//! Small helpers for services that talk to PostgreSQL and HTTP:
//! running a unit of work inside a transaction, reading SQLSTATE codes off
//! database errors, sending one-shot HTTP requests, and (behind the
//! `testutil` feature) starting throwaway Postgres containers for tests.

pub mod context;
pub mod error;
pub mod executor;
pub mod http;
pub mod options;
pub mod pg_error;
#[cfg(feature = "testutil")]
pub mod testutil;
pub mod transaction;
pub mod unit_of_work;

pub use context::{Context, ContextError};
pub use error::{TransactionError, TransactionResult, TxError};
pub use executor::{Executor, ExecutorGuard};
pub use http::{send_request, HttpError, RequestOptions};
pub use options::{IsolationLevel, TxOptions};
pub use pg_error::pg_err_code;
pub use transaction::{with_transaction, SessionExecutor};
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkSession, UnitOfWork, UnitOfWorkSession};
