//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod fixtures;
mod local;
mod remote;
mod guard;

#[cfg(test)]
mod tests;

pub use traits::{ExpenseRepository, Repository, TaskRepository};
pub use db::{init_db, KvStore};
pub use fixtures::fixture;
pub use local::{Latency, LocalOptions, LocalRepository};
pub use remote::RemoteRepository;
pub use guard::GuardedFarmRepository;
