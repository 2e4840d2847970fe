//! Online/offline indicator state

use std::sync::Arc;

use chrono::NaiveDateTime;
use farmlog_data::domain::DomainResult;
use farmlog_data::repository::KvStore;

use crate::dates::Clock;

/// Key-value store key holding the last successful sync
pub const LAST_SYNC_KEY: &str = "lastSync";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

pub struct Connectivity {
    store: KvStore,
    clock: Arc<dyn Clock>,
    offline: bool,
    last_sync: NaiveDateTime,
}

impl Connectivity {
    /// Read the persisted sync time; a missing or unreadable value counts
    /// as "now"
    pub async fn open(store: KvStore, clock: Arc<dyn Clock>, online: bool) -> DomainResult<Self> {
        let last_sync = store
            .get(LAST_SYNC_KEY)
            .await?
            .and_then(|raw| NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).ok())
            .unwrap_or_else(|| clock.now());
        Ok(Self {
            store,
            clock,
            offline: !online,
            last_sync,
        })
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn last_sync(&self) -> NaiveDateTime {
        self.last_sync
    }

    /// Back online: stamp and persist the sync time
    pub async fn went_online(&mut self) -> DomainResult<()> {
        self.offline = false;
        self.last_sync = self.clock.now();
        self.store
            .set(LAST_SYNC_KEY, &self.last_sync.format(TIMESTAMP_FORMAT).to_string())
            .await?;
        log::info!("Back online, last sync {}", self.last_sync);
        Ok(())
    }

    pub fn went_offline(&mut self) {
        if !self.offline {
            log::warn!("Connection lost");
        }
        self.offline = true;
    }
}
