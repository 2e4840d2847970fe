//! Local Repository Implementation
//!
//! Key-value backed implementation of Repository<T>. Each collection is one
//! JSON array stored under `farmlog_<table>`, seeded from the bundled fixture
//! the first time it is read.
//!
//! Identifiers come from a per-collection counter stored under
//! `farmlog_<table>_seq` and are never reused, even after deleting the
//! highest id.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rusqlite::Connection;
use std::marker::PhantomData;
use std::time::Duration;

use super::db::{kv_get, kv_set, KvStore};
use super::fixtures::fixture;
use super::traits::{ExpenseRepository, Repository, TaskRepository};
use crate::domain::{DomainError, DomainResult, Entity, Expense, Task};

/// Artificial delay applied to every operation, emulating a network round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for Latency {
    fn default() -> Self {
        Self { min_ms: 200, max_ms: 500 }
    }
}

impl Latency {
    /// One random delay within the bounds
    pub fn sample(&self) -> Duration {
        let ms = if self.max_ms > self.min_ms {
            rand::rng().random_range(self.min_ms..=self.max_ms)
        } else {
            self.min_ms
        };
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOptions {
    /// Seed empty collections from the bundled fixtures
    pub seed_fixtures: bool,
    /// `None` disables the artificial delay
    pub latency: Option<Latency>,
}

pub struct LocalRepository<T: Entity> {
    store: KvStore,
    options: LocalOptions,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> LocalRepository<T> {
    pub fn new(store: KvStore, options: LocalOptions) -> Self {
        Self {
            store,
            options,
            _marker: PhantomData,
        }
    }

    pub fn collection_key() -> String {
        format!("farmlog_{}", T::TABLE)
    }

    fn sequence_key() -> String {
        format!("farmlog_{}_seq", T::TABLE)
    }

    fn seed(&self) -> Option<&'static str> {
        if self.options.seed_fixtures {
            fixture(T::TABLE)
        } else {
            None
        }
    }

    async fn delay(&self) {
        if let Some(latency) = self.options.latency {
            tokio::time::sleep(latency.sample()).await;
        }
    }
}

/// Read a collection, writing the seed first if the key has never been set
fn read_collection<T: Entity>(conn: &Connection, key: &str, seed: Option<&str>) -> DomainResult<Vec<T>> {
    match kv_get(conn, key)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => match seed {
            Some(seed) => {
                let items: Vec<T> = serde_json::from_str(seed)?;
                kv_set(conn, key, seed)?;
                log::info!("Seeded {} with {} record(s)", key, items.len());
                Ok(items)
            }
            None => Ok(Vec::new()),
        },
    }
}

fn write_collection<T: Entity>(conn: &Connection, key: &str, items: &[T]) -> DomainResult<()> {
    let json = serde_json::to_string(items)?;
    kv_set(conn, key, &json)
}

/// Next id: one past the larger of the stored counter and the largest id in
/// the collection (seed data may be ahead of the counter)
fn next_id<T: Entity>(conn: &Connection, seq_key: &str, items: &[T]) -> DomainResult<u32> {
    let counter = kv_get(conn, seq_key)?
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);
    let max_existing = items.iter().map(|e| e.id()).max().unwrap_or(0);
    counter
        .max(max_existing)
        .checked_add(1)
        .ok_or_else(|| DomainError::Internal(format!("identifier space exhausted for {}", seq_key)))
}

#[async_trait]
impl<T: Entity> Repository<T> for LocalRepository<T> {
    async fn create(&self, entity: &T) -> DomainResult<T> {
        self.delay().await;
        let key = Self::collection_key();
        let seq_key = Self::sequence_key();
        let seed = self.seed();
        let mut entity = entity.clone();

        let created = self
            .store
            .with_conn(move |conn| {
                let mut items: Vec<T> = read_collection(conn, &key, seed)?;
                let id = next_id(conn, &seq_key, &items)?;
                entity.set_id(id);
                entity.on_create(Utc::now());
                items.push(entity.clone());
                write_collection(conn, &key, &items)?;
                kv_set(conn, &seq_key, &id.to_string())?;
                Ok(entity)
            })
            .await?;

        log::info!("Created {} {}", T::KIND, created.id());
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<T>> {
        let items = self.list().await?;
        Ok(items.into_iter().find(|e| e.id() == id))
    }

    async fn list(&self) -> DomainResult<Vec<T>> {
        self.delay().await;
        let key = Self::collection_key();
        let seed = self.seed();
        self.store.with_conn(move |conn| read_collection(conn, &key, seed)).await
    }

    async fn update(&self, entity: &T) -> DomainResult<T> {
        self.delay().await;
        let key = Self::collection_key();
        let seed = self.seed();
        let mut entity = entity.clone();

        self.store
            .with_conn(move |conn| {
                let mut items: Vec<T> = read_collection(conn, &key, seed)?;
                let id = entity.id();
                let slot = items
                    .iter_mut()
                    .find(|e| e.id() == id)
                    .ok_or_else(|| DomainError::NotFound(format!("{} {} not found", T::KIND, id)))?;
                entity.keep_store_fields(slot);
                *slot = entity.clone();
                write_collection(conn, &key, &items)?;
                Ok(entity)
            })
            .await
    }

    async fn delete(&self, id: u32) -> DomainResult<bool> {
        self.delay().await;
        let key = Self::collection_key();
        let seed = self.seed();

        let removed = self
            .store
            .with_conn(move |conn| {
                let mut items: Vec<T> = read_collection(conn, &key, seed)?;
                let before = items.len();
                items.retain(|e| e.id() != id);
                let removed = items.len() != before;
                if removed {
                    write_collection(conn, &key, &items)?;
                }
                Ok(removed)
            })
            .await?;

        if removed {
            log::info!("Deleted {} {}", T::KIND, id);
        }
        Ok(removed)
    }
}

impl TaskRepository for LocalRepository<Task> {}

impl ExpenseRepository for LocalRepository<Expense> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_sample_in_range() {
        let latency = Latency::default();
        for _ in 0..50 {
            let d = latency.sample();
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(500));
        }
        let fixed = Latency { min_ms: 5, max_ms: 5 };
        assert_eq!(fixed.sample(), Duration::from_millis(5));
    }

    #[test]
    fn test_collection_key() {
        assert_eq!(LocalRepository::<Task>::collection_key(), "farmlog_tasks");
        assert_eq!(LocalRepository::<Expense>::sequence_key(), "farmlog_expenses_seq");
    }
}
