#![allow(dead_code, unused_imports)]

pub mod entities;
pub mod logging;
pub mod mock;
pub mod repositories;

pub use entities::{Order, User};
pub use mock::{Event, Failures, MockUnitOfWork};
pub use repositories::{OrderRepository, UserRepository};

/// Business error raised by the units of work in these tests.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("insufficient funds")]
    InsufficientFunds,
}
