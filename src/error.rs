use crate::context::ContextError;

/// Error type for transaction session operations
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transaction already committed or rolled back")]
    Finished,

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Result type for transaction session operations
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Terminal outcome of [`with_transaction`](crate::with_transaction) when it
/// does not succeed.
///
/// Each variant names the step that failed so callers can tell a clean
/// business failure apart from one that left the transaction in an unknown
/// state.
#[derive(Debug, thiserror::Error)]
pub enum TxError<E> {
    /// The transaction could not be started. The unit of work never ran.
    #[error("begin error: {0}")]
    BeginFailed(#[source] TransactionError),

    /// The unit of work failed and so did the rollback that followed.
    #[error("rollback error: {rollback} (outer error: {work})")]
    RollbackFailedAfterWorkFailed {
        rollback: TransactionError,
        #[source]
        work: E,
    },

    /// The unit of work failed and the transaction was rolled back.
    #[error("tx rollback: {0}")]
    WorkFailed(#[source] E),

    /// The unit of work succeeded but the commit did not.
    #[error("commit error: {0}")]
    CommitFailed(#[source] TransactionError),
}

impl<E> TxError<E> {
    /// The unit-of-work error, for the variants that carry one.
    pub fn work_error(&self) -> Option<&E> {
        match self {
            TxError::RollbackFailedAfterWorkFailed { work, .. } | TxError::WorkFailed(work) => {
                Some(work)
            }
            TxError::BeginFailed(_) | TxError::CommitFailed(_) => None,
        }
    }

    /// Owned counterpart of [`TxError::work_error`].
    pub fn into_work_error(self) -> Option<E> {
        match self {
            TxError::RollbackFailedAfterWorkFailed { work, .. } | TxError::WorkFailed(work) => {
                Some(work)
            }
            TxError::BeginFailed(_) | TxError::CommitFailed(_) => None,
        }
    }

    /// The begin, commit or rollback error, for the variants that carry one.
    pub fn transaction_error(&self) -> Option<&TransactionError> {
        match self {
            TxError::BeginFailed(err)
            | TxError::CommitFailed(err)
            | TxError::RollbackFailedAfterWorkFailed { rollback: err, .. } => Some(err),
            TxError::WorkFailed(_) => None,
        }
    }
}
