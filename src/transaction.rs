use std::future::Future;

use crate::{Context, TransactionError, TxError, TxOptions, UnitOfWork, UnitOfWorkSession};

/// Executor handle type handed to units of work begun from `U`.
pub type SessionExecutor<U> = <<U as UnitOfWork>::Session as UnitOfWorkSession>::Executor;

/// Executes `work` in a transaction.
///
/// The transaction is committed if `work` succeeds and rolled back if it
/// fails; on every path past a successful begin exactly one of the two is
/// invoked. `ctx` bounds the begin step. It is checked once more before
/// committing: if it finished while `work` ran, the transaction is rolled
/// back and the commit reported as failed. Commit and rollback themselves
/// always run to completion.
///
/// ```ignore
/// let uow = PostgresUnitOfWork::new(Arc::new(pool));
/// with_transaction(&ctx, &uow, &TxOptions::default(), |executor| async move {
///     let mut tx = executor.acquire().await?;
///     sqlx::query("UPDATE accounts SET balance = balance - 10 WHERE id = $1")
///         .bind(id)
///         .execute(&mut **tx)
///         .await?;
///     Ok::<_, TransactionError>(())
/// })
/// .await?;
/// ```
pub async fn with_transaction<U, F, Fut, T, E>(
    ctx: &Context,
    uow: &U,
    options: &TxOptions,
    work: F,
) -> Result<T, TxError<E>>
where
    U: UnitOfWork,
    F: FnOnce(SessionExecutor<U>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let session = ctx
        .run(uow.begin(options))
        .await
        .map_err(TxError::BeginFailed)?;

    match work(session.executor().clone()).await {
        Ok(value) => {
            if let Some(done) = ctx.err() {
                // A failed rollback outranks the context error: the
                // transaction state is then unknown.
                session.rollback().await.map_err(TxError::CommitFailed)?;
                return Err(TxError::CommitFailed(TransactionError::Context(done)));
            }
            session.commit().await.map_err(TxError::CommitFailed)?;
            Ok(value)
        }
        Err(work) => match session.rollback().await {
            Ok(()) => Err(TxError::WorkFailed(work)),
            Err(rollback) => Err(TxError::RollbackFailedAfterWorkFailed { rollback, work }),
        },
    }
}
