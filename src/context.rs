//! Application Context
//!
//! The services every screen needs, constructed once per session and handed
//! to each controller.

use std::sync::Arc;

use farmlog_data::client::{HttpRecordClient, RecordClient};
use farmlog_data::domain::{Crop, Expense, Farm, Task};
use farmlog_data::notify::Notifier;
use farmlog_data::repository::{
    init_db, ExpenseRepository, GuardedFarmRepository, KvStore, LocalOptions, LocalRepository, RemoteRepository,
    Repository, TaskRepository,
};

use crate::config::{AppConfig, Backend, ConfigError};
use crate::dates::{Clock, SystemClock};
use crate::weather::{MockWeather, WeatherSource};

/// Shared services. Cloning is cheap.
#[derive(Clone)]
pub struct AppContext {
    /// Refuses to delete farms that still have dependents
    pub farms: Arc<dyn Repository<Farm>>,
    pub crops: Arc<dyn Repository<Crop>>,
    pub tasks: Arc<dyn TaskRepository>,
    pub expenses: Arc<dyn ExpenseRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub weather: Arc<dyn WeatherSource>,
    /// Local key-value store (connectivity state, and data for the local backend)
    pub store: KvStore,
}

impl AppContext {
    fn assemble(
        farms: Arc<dyn Repository<Farm>>,
        crops: Arc<dyn Repository<Crop>>,
        tasks: Arc<dyn TaskRepository>,
        expenses: Arc<dyn ExpenseRepository>,
        notifier: Arc<dyn Notifier>,
        store: KvStore,
    ) -> Self {
        let guarded = GuardedFarmRepository::new(farms, crops.clone(), tasks.clone(), expenses.clone());
        Self {
            farms: Arc::new(guarded),
            crops,
            tasks,
            expenses,
            notifier,
            clock: Arc::new(SystemClock),
            weather: Arc::new(MockWeather::default()),
            store,
        }
    }

    /// Everything stored in the local key-value store
    pub fn local(store: KvStore, options: LocalOptions, notifier: Arc<dyn Notifier>) -> Self {
        Self::assemble(
            Arc::new(LocalRepository::<Farm>::new(store.clone(), options)),
            Arc::new(LocalRepository::<Crop>::new(store.clone(), options)),
            Arc::new(LocalRepository::<Task>::new(store.clone(), options)),
            Arc::new(LocalRepository::<Expense>::new(store.clone(), options)),
            notifier,
            store,
        )
    }

    /// Everything stored at the record store behind `client`
    pub fn remote(client: Option<Arc<dyn RecordClient>>, notifier: Arc<dyn Notifier>, store: KvStore) -> Self {
        Self::assemble(
            Arc::new(RemoteRepository::<Farm>::new(client.clone(), notifier.clone())),
            Arc::new(RemoteRepository::<Crop>::new(client.clone(), notifier.clone())),
            Arc::new(RemoteRepository::<Task>::new(client.clone(), notifier.clone())),
            Arc::new(RemoteRepository::<Expense>::new(client, notifier.clone())),
            notifier,
            store,
        )
    }

    pub async fn from_config(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ConfigError> {
        let store = init_db(&config.db_path).await.map_err(ConfigError::Store)?;
        let ctx = match config.backend {
            Backend::Local => Self::local(store, config.local_options(), notifier),
            Backend::Remote => {
                let client: Option<Arc<dyn RecordClient>> = match &config.remote_url {
                    Some(url) => Some(Arc::new(HttpRecordClient::new(url.clone(), config.remote_token.clone()))),
                    None => {
                        log::warn!("Remote backend selected without a URL; screens will show no data");
                        None
                    }
                };
                Self::remote(client, notifier, store)
            }
        };
        log::info!("Application context ready ({:?} backend)", config.backend);
        Ok(ctx)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherSource>) -> Self {
        self.weather = weather;
        self
    }
}
