//! Farm grid screen

use std::collections::HashMap;

use farmlog_data::domain::{Crop, DomainError, Farm};
use farmlog_data::notify::NotificationLevel;
use farmlog_data::repository::Repository;

use super::{mutation_failed, CancelHandle, LoadState, ScreenError};
use crate::context::AppContext;
use crate::forms::{validate_farm, FormValues};

/// One card in the farm grid
#[derive(Debug, Clone, PartialEq)]
pub struct FarmCard {
    pub farm: Farm,
    pub crop_count: usize,
}

pub struct FarmList {
    ctx: AppContext,
    cancel: CancelHandle,
    pub state: LoadState,
    pub farms: Vec<Farm>,
    crop_counts: HashMap<u32, usize>,
}

impl FarmList {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            cancel: CancelHandle::new(),
            state: LoadState::Idle,
            farms: Vec::new(),
            crop_counts: HashMap::new(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let ticket = self.cancel.begin();
        self.state = LoadState::Loading;

        let result = tokio::try_join!(self.ctx.farms.list(), self.ctx.crops.list());
        if !ticket.is_current() {
            log::debug!("Discarding stale farm load");
            return Err(ScreenError::Cancelled);
        }

        match result {
            Ok((farms, crops)) => {
                self.crop_counts = count_by_farm(&crops);
                self.farms = farms;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                log::error!("Farm loading error: {}", e);
                self.state = LoadState::Failed("Failed to load farms".to_string());
                Err(ScreenError::Load {
                    message: "Failed to load farms".to_string(),
                    source: e,
                })
            }
        }
    }

    pub async fn retry(&mut self) -> Result<(), ScreenError> {
        self.load().await
    }

    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.load().await {
            log::warn!("Reload after farm change failed: {}", e);
        }
    }

    pub fn crop_count(&self, farm_id: u32) -> usize {
        self.crop_counts.get(&farm_id).copied().unwrap_or(0)
    }

    pub fn cards(&self) -> Vec<FarmCard> {
        self.farms
            .iter()
            .map(|farm| FarmCard {
                farm: farm.clone(),
                crop_count: self.crop_count(farm.id),
            })
            .collect()
    }

    /// No farms yet: the screen shows its "add your first farm" prompt
    pub fn is_empty(&self) -> bool {
        self.state.is_ready() && self.farms.is_empty()
    }

    pub async fn save(&mut self, values: &FormValues, editing: Option<u32>) -> Result<Farm, ScreenError> {
        let farm = validate_farm(values, editing.unwrap_or(0))?;

        let result = match editing {
            Some(_) => self.ctx.farms.update(&farm).await,
            None => self.ctx.farms.create(&farm).await,
        };
        let saved = result.map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to save farm", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success(match editing {
            Some(_) => "Farm updated successfully",
            None => "Farm created successfully",
        });
        Ok(saved)
    }

    /// Farms that still have crops, tasks or expenses are kept
    pub async fn delete(&mut self, id: u32) -> Result<bool, ScreenError> {
        let removed = match self.ctx.farms.delete(id).await {
            Ok(removed) => removed,
            Err(DomainError::Conflict(detail)) => {
                self.ctx.notifier.notify(NotificationLevel::Warning, &detail);
                return Err(mutation_failed(
                    self.ctx.notifier.as_ref(),
                    "Failed to delete farm",
                    DomainError::Conflict(detail),
                ));
            }
            Err(e) => return Err(mutation_failed(self.ctx.notifier.as_ref(), "Failed to delete farm", e)),
        };

        self.reload_after_mutation().await;
        self.ctx.notifier.success("Farm deleted successfully");
        Ok(removed)
    }
}

fn count_by_farm(crops: &[Crop]) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for crop in crops {
        *counts.entry(crop.farm_id).or_insert(0) += 1;
    }
    counts
}
