use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use handyman::{TransactionError, TransactionResult, TxOptions, UnitOfWork, UnitOfWorkSession};

/// Lifecycle calls observed by a [`MockUnitOfWork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Begin(TxOptions),
    Commit,
    Rollback,
}

/// Which lifecycle steps should fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Failures {
    pub begin: bool,
    pub commit: bool,
    pub rollback: bool,
}

#[derive(Debug, Default)]
struct Store {
    committed: Vec<String>,
    events: Vec<Event>,
}

/// In-memory transaction source. Rows written through a session become
/// visible in `rows()` only after a successful commit.
#[derive(Clone, Default)]
pub struct MockUnitOfWork {
    failures: Failures,
    commit_delay: Option<Duration>,
    store: Arc<Mutex<Store>>,
}

impl MockUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: Failures) -> Self {
        Self {
            failures,
            ..Default::default()
        }
    }

    /// Make every commit take `delay` before it lands.
    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = Some(delay);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.store.lock().events.clone()
    }

    pub fn rows(&self) -> Vec<String> {
        self.store.lock().committed.clone()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockExecutor {
    pending: Arc<Mutex<Vec<String>>>,
}

impl MockExecutor {
    pub fn insert(&self, row: impl Into<String>) {
        self.pending.lock().push(row.into());
    }
}

pub struct MockSession {
    executor: MockExecutor,
    failures: Failures,
    commit_delay: Option<Duration>,
    store: Arc<Mutex<Store>>,
}

#[async_trait]
impl UnitOfWork for MockUnitOfWork {
    type Session = MockSession;

    async fn begin(&self, options: &TxOptions) -> TransactionResult<MockSession> {
        self.store.lock().events.push(Event::Begin(*options));
        if self.failures.begin {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(MockSession {
            executor: MockExecutor::default(),
            failures: self.failures,
            commit_delay: self.commit_delay,
            store: self.store.clone(),
        })
    }
}

#[async_trait]
impl UnitOfWorkSession for MockSession {
    type Executor = MockExecutor;

    fn executor(&self) -> &MockExecutor {
        &self.executor
    }

    async fn commit(self) -> TransactionResult<()> {
        if let Some(delay) = self.commit_delay {
            tokio::time::sleep(delay).await;
        }
        let rows = std::mem::take(&mut *self.executor.pending.lock());
        let mut store = self.store.lock();
        store.events.push(Event::Commit);
        if self.failures.commit {
            return Err(TransactionError::Database(sqlx::Error::Protocol(
                "commit refused".to_string(),
            )));
        }
        store.committed.extend(rows);
        Ok(())
    }

    async fn rollback(self) -> TransactionResult<()> {
        self.executor.pending.lock().clear();
        self.store.lock().events.push(Event::Rollback);
        if self.failures.rollback {
            return Err(TransactionError::Database(sqlx::Error::Protocol(
                "connection reset during rollback".to_string(),
            )));
        }
        Ok(())
    }
}
