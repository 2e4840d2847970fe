//! Crop list screen

use farmlog_data::domain::{Crop, CropStatus, Farm};
use farmlog_data::repository::Repository;

use super::{mutation_failed, CancelHandle, LoadState, ScreenError};
use crate::context::AppContext;
use crate::forms::{validate_crop, FormValues};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropFilter {
    pub farm_id: Option<u32>,
    pub status: Option<CropStatus>,
}

impl CropFilter {
    /// Filter opened from a farm card's "View Crops"
    pub fn for_farm(farm_id: u32) -> Self {
        Self {
            farm_id: Some(farm_id),
            status: None,
        }
    }

    pub fn apply(&self, crops: &[Crop]) -> Vec<Crop> {
        crops
            .iter()
            .filter(|c| self.farm_id.is_none_or(|id| c.farm_id == id))
            .filter(|c| self.status.is_none_or(|s| c.status == s))
            .cloned()
            .collect()
    }
}

pub struct CropList {
    ctx: AppContext,
    cancel: CancelHandle,
    pub state: LoadState,
    pub crops: Vec<Crop>,
    pub farms: Vec<Farm>,
    pub filter: CropFilter,
}

impl CropList {
    pub fn new(ctx: AppContext, filter: CropFilter) -> Self {
        Self {
            ctx,
            cancel: CancelHandle::new(),
            state: LoadState::Idle,
            crops: Vec::new(),
            farms: Vec::new(),
            filter,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let ticket = self.cancel.begin();
        self.state = LoadState::Loading;

        let result = tokio::try_join!(self.ctx.crops.list(), self.ctx.farms.list());
        if !ticket.is_current() {
            log::debug!("Discarding stale crop load");
            return Err(ScreenError::Cancelled);
        }

        match result {
            Ok((crops, farms)) => {
                self.crops = crops;
                self.farms = farms;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                log::error!("Crop loading error: {}", e);
                self.state = LoadState::Failed("Failed to load crops".to_string());
                Err(ScreenError::Load {
                    message: "Failed to load crops".to_string(),
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
            log::warn!("Reload after crop change failed: {}", e);
        }
    }

    pub fn visible(&self) -> Vec<Crop> {
        self.filter.apply(&self.crops)
    }

    pub fn farm_name(&self, farm_id: u32) -> &str {
        self.farms
            .iter()
            .find(|f| f.id == farm_id)
            .map(|f| f.name.as_str())
            .unwrap_or("Unknown Farm")
    }

    pub async fn save(&mut self, values: &FormValues, editing: Option<u32>) -> Result<Crop, ScreenError> {
        let crop = validate_crop(values, editing.unwrap_or(0), &self.farms)?;

        let result = match editing {
            Some(_) => self.ctx.crops.update(&crop).await,
            None => self.ctx.crops.create(&crop).await,
        };
        let saved = result.map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to save crop", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success(match editing {
            Some(_) => "Crop updated successfully",
            None => "Crop created successfully",
        });
        Ok(saved)
    }

    pub async fn delete(&mut self, id: u32) -> Result<bool, ScreenError> {
        let removed = self
            .ctx
            .crops
            .delete(id)
            .await
            .map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to delete crop", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success("Crop deleted successfully");
        Ok(removed)
    }
}
