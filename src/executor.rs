use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::{TransactionError, TransactionResult};

/// Executor wraps a database transaction for use by repositories.
///
/// This is the transaction handle a unit of work receives. Clones share the
/// same transaction, so several repositories can take part in one unit of
/// work. Once the owning session commits or rolls back, every clone reports
/// [`TransactionError::Finished`].
#[derive(Clone, Debug)]
pub struct Executor {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

/// Exclusive access to the open transaction held by an [`Executor`].
pub type ExecutorGuard<'a> = MappedMutexGuard<'a, Transaction<'static, Postgres>>;

impl Executor {
    /// Creates a new Executor from a PostgreSQL transaction.
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Lock the transaction for running statements.
    ///
    /// ```ignore
    /// let mut tx = executor.acquire().await?;
    /// sqlx::query("DELETE FROM sessions").execute(&mut **tx).await?;
    /// ```
    pub async fn acquire(&self) -> TransactionResult<ExecutorGuard<'_>> {
        MutexGuard::try_map(self.tx.lock().await, |tx| tx.as_mut())
            .map_err(|_| TransactionError::Finished)
    }

    pub async fn is_finished(&self) -> bool {
        self.tx.lock().await.is_none()
    }

    /// Takes ownership of the transaction, leaving None in its place.
    /// This should only be called when committing or rolling back.
    pub(crate) async fn take_transaction(&self) -> TransactionResult<Transaction<'static, Postgres>> {
        self.tx.lock().await.take().ok_or(TransactionError::Finished)
    }

    /// Drops a still-open transaction without waiting for the lock.
    /// Returns true if one was discarded.
    pub(crate) fn discard(&self) -> bool {
        match self.tx.try_lock() {
            Ok(mut guard) => guard.take().is_some(),
            Err(_) => false,
        }
    }
}
