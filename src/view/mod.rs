//! Screen controllers
//!
//! One controller per list screen. Each owns its loading state and the
//! collections it fetched, filters them locally, and reloads everything
//! after a mutation.

mod dashboard;
mod expense_list;
mod crop_list;
mod farm_list;
mod task_list;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use farmlog_data::domain::DomainError;
use farmlog_data::notify::Notifier;
use thiserror::Error;

use crate::forms::ValidationError;

pub use crop_list::{CropFilter, CropList};
pub use dashboard::{Dashboard, DashboardSummary, UPCOMING_WINDOW_DAYS};
pub use expense_list::{ExpenseFilter, ExpenseList, ExpenseTotals};
pub use farm_list::{FarmCard, FarmList};
pub use task_list::{filter_tasks, sort_tasks, TaskFilter, TaskList, TaskStatusFilter};

/// Where a screen is in its load cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Message shown next to the retry action
    Failed(String),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }
}

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("{message}: {source}")]
    Load {
        message: String,
        #[source]
        source: DomainError,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A newer load started, or the screen went away, before this one finished
    #[error("load superseded")]
    Cancelled,
}

/// Generation counter shared between a screen and whoever may abandon it.
///
/// Every load takes a ticket; results are only committed while the ticket
/// is still current. Starting another load or calling `cancel` makes every
/// outstanding ticket stale.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    generation: Arc<AtomicU64>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> LoadTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        LoadTicket {
            generation,
            source: Arc::clone(&self.generation),
        }
    }

    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    source: Arc<AtomicU64>,
}

impl LoadTicket {
    pub fn is_current(&self) -> bool {
        self.source.load(Ordering::SeqCst) == self.generation
    }
}

/// Log and surface a failed create/update/delete
fn mutation_failed(notifier: &dyn Notifier, message: &str, error: DomainError) -> ScreenError {
    log::error!("{}: {}", message, error);
    notifier.error(message);
    ScreenError::Domain(error)
}
