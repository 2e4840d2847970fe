//! Dashboard screen

use chrono::Datelike;
use farmlog_data::domain::{Crop, Farm, Task};
use farmlog_data::repository::{ExpenseRepository, Repository, TaskRepository};

use super::{CancelHandle, LoadState, ScreenError};
use crate::context::AppContext;
use crate::dates::DisplayStatus;
use crate::weather::Weather;

/// Days ahead counted as "upcoming"
pub const UPCOMING_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub farm_count: usize,
    /// Crops not yet harvested
    pub active_crops: usize,
    pub upcoming_tasks: usize,
    /// Sum of this calendar month's expenses
    pub monthly_expenses: f64,
}

pub struct Dashboard {
    ctx: AppContext,
    cancel: CancelHandle,
    pub state: LoadState,
    pub farms: Vec<Farm>,
    pub crops: Vec<Crop>,
    pub upcoming: Vec<Task>,
    pub monthly_expenses: f64,
    /// Loaded separately; `None` until it arrives or when it failed
    pub weather: Option<Weather>,
}

impl Dashboard {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            cancel: CancelHandle::new(),
            state: LoadState::Idle,
            farms: Vec::new(),
            crops: Vec::new(),
            upcoming: Vec::new(),
            monthly_expenses: 0.0,
            weather: None,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let ticket = self.cancel.begin();
        self.state = LoadState::Loading;
        let today = self.ctx.clock.today();

        let result = tokio::try_join!(
            self.ctx.farms.list(),
            self.ctx.crops.list(),
            self.ctx.tasks.upcoming(UPCOMING_WINDOW_DAYS, today),
            self.ctx.expenses.monthly_total(today.year(), today.month()),
        );
        if !ticket.is_current() {
            log::debug!("Discarding stale dashboard load");
            return Err(ScreenError::Cancelled);
        }

        match result {
            Ok((farms, crops, upcoming, monthly_expenses)) => {
                self.monthly_expenses = monthly_expenses;
                self.farms = farms;
                self.crops = crops;
                self.upcoming = upcoming;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                log::error!("Dashboard loading error: {}", e);
                self.state = LoadState::Failed("Failed to load dashboard data".to_string());
                Err(ScreenError::Load {
                    message: "Failed to load dashboard data".to_string(),
                    source: e,
                })
            }
        }
    }

    pub async fn retry(&mut self) -> Result<(), ScreenError> {
        self.load().await
    }

    /// The weather card loads on its own; a failure only empties the card
    pub async fn load_weather(&mut self) {
        match self.ctx.weather.current().await {
            Ok(weather) => self.weather = Some(weather),
            Err(e) => {
                log::warn!("Weather unavailable: {}", e);
                self.weather = None;
            }
        }
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            farm_count: self.farms.len(),
            active_crops: self.crops.iter().filter(|c| c.is_active()).count(),
            upcoming_tasks: self.upcoming.len(),
            monthly_expenses: self.monthly_expenses,
        }
    }

    /// No farms yet: show the welcome prompt instead of metrics
    pub fn is_welcome(&self) -> bool {
        self.state.is_ready() && self.farms.is_empty()
    }

    pub fn task_status(&self, task: &Task) -> DisplayStatus {
        DisplayStatus::for_task(task, self.ctx.clock.as_ref())
    }

    pub fn farm_name(&self, farm_id: u32) -> &str {
        self.farms
            .iter()
            .find(|f| f.id == farm_id)
            .map(|f| f.name.as_str())
            .unwrap_or("Unknown Farm")
    }

    pub fn crop_name(&self, crop_id: Option<u32>) -> Option<&str> {
        let crop_id = crop_id?;
        Some(
            self.crops
                .iter()
                .find(|c| c.id == crop_id)
                .map(|c| c.variety.as_str())
                .unwrap_or("Unknown Crop"),
        )
    }
}
