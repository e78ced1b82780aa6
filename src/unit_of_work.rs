use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{Executor, TransactionResult, TxOptions};

/// Unit of Work pattern for managing database transactions.
///
/// The UnitOfWork is the transaction source: it begins new sessions with the
/// given options and is safe to share between concurrent callers.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Begin a new transaction session.
    async fn begin(&self, options: &TxOptions) -> TransactionResult<Self::Session>;
}

/// Represents a single database transaction session.
///
/// Exactly one of `commit` or `rollback` ends a session; both consume it.
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync + Sized {
    /// Handle through which a unit of work runs statements.
    type Executor: Clone + Send + Sync;

    /// Get the executor for this session (provides access to the transaction).
    fn executor(&self) -> &Self::Executor;

    async fn commit(self) -> TransactionResult<()>;

    async fn rollback(self) -> TransactionResult<()>;
}

/// Default implementation of UnitOfWork for PostgreSQL.
#[derive(Clone, Debug)]
pub struct PostgresUnitOfWork {
    pool: Arc<PgPool>,
}

impl PostgresUnitOfWork {
    /// Create a new PostgresUnitOfWork with the given connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Session = PostgresUnitOfWorkSession;

    async fn begin(&self, options: &TxOptions) -> TransactionResult<Self::Session> {
        let mut tx = self.pool.begin().await?;
        // Dropping `tx` on error rolls it back.
        if let Some(stmt) = options.to_sql() {
            sqlx::query(&stmt).execute(&mut *tx).await?;
        }
        Ok(PostgresUnitOfWorkSession::new(tx))
    }
}

/// Default implementation of UnitOfWorkSession for PostgreSQL.
///
/// A session dropped before it commits or rolls back discards its
/// transaction, which sqlx rolls back when the connection returns to the pool.
#[derive(Debug)]
pub struct PostgresUnitOfWorkSession {
    executor: Executor,
}

impl PostgresUnitOfWorkSession {
    /// Create a new session from a PostgreSQL transaction.
    pub fn new(tx: sqlx::Transaction<'static, sqlx::Postgres>) -> Self {
        Self {
            executor: Executor::new(tx),
        }
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresUnitOfWorkSession {
    type Executor = Executor;

    fn executor(&self) -> &Executor {
        &self.executor
    }

    async fn commit(self) -> TransactionResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> TransactionResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.rollback().await?;
        Ok(())
    }
}

impl Drop for PostgresUnitOfWorkSession {
    fn drop(&mut self) {
        if self.executor.discard() {
            tracing::warn!("transaction session dropped while open; rolling back");
        }
    }
}
