//! Storage layer for the order-to-cash backend.
//!
//! [`Storage`] covers reads and standalone writes; [`StorageTx`] scopes the
//! multi-row mutations that must land atomically. Two implementations ship:
//! [`PostgresStorage`] for production and [`InMemoryStorage`] for tests,
//! with identical transaction semantics.

mod error;
mod memory;
mod postgres;
mod storage;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStorage, InMemoryTx};
pub use postgres::{PostgresStorage, PostgresTx};
pub use storage::{Storage, StorageTx};
