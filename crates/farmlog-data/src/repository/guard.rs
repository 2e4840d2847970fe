//! Farm deletion guard
//!
//! Wraps a farm repository and refuses to delete a farm that other
//! collections still point at, or whose dependents cannot be listed. Every
//! other operation passes straight through.

use async_trait::async_trait;
use std::sync::Arc;

use super::traits::{ExpenseRepository, Repository, TaskRepository};
use crate::domain::{Crop, DomainError, DomainResult, Farm};

pub struct GuardedFarmRepository {
    farms: Arc<dyn Repository<Farm>>,
    crops: Arc<dyn Repository<Crop>>,
    tasks: Arc<dyn TaskRepository>,
    expenses: Arc<dyn ExpenseRepository>,
}

impl GuardedFarmRepository {
    pub fn new(
        farms: Arc<dyn Repository<Farm>>,
        crops: Arc<dyn Repository<Crop>>,
        tasks: Arc<dyn TaskRepository>,
        expenses: Arc<dyn ExpenseRepository>,
    ) -> Self {
        Self {
            farms,
            crops,
            tasks,
            expenses,
        }
    }

    /// Names of the collections still referencing `farm_id`, with counts
    async fn dependents(&self, farm_id: u32) -> DomainResult<Vec<(usize, &'static str)>> {
        let (crops, tasks, expenses) = tokio::try_join!(
            self.crops.list_by_farm_strict(farm_id),
            self.tasks.list_by_farm_strict(farm_id),
            self.expenses.list_by_farm_strict(farm_id),
        )
        .inspect_err(|e| log::warn!("Cannot verify dependents of farm {}, keeping it: {}", farm_id, e))?;

        Ok([(crops.len(), "crop(s)"), (tasks.len(), "task(s)"), (expenses.len(), "expense(s)")]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .collect())
    }
}

#[async_trait]
impl Repository<Farm> for GuardedFarmRepository {
    async fn create(&self, entity: &Farm) -> DomainResult<Farm> {
        self.farms.create(entity).await
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<Farm>> {
        self.farms.find_by_id(id).await
    }

    async fn list(&self) -> DomainResult<Vec<Farm>> {
        self.farms.list().await
    }

    async fn update(&self, entity: &Farm) -> DomainResult<Farm> {
        self.farms.update(entity).await
    }

    async fn delete(&self, id: u32) -> DomainResult<bool> {
        let dependents = self.dependents(id).await?;
        if !dependents.is_empty() {
            let summary = dependents
                .iter()
                .map(|(n, what)| format!("{} {}", n, what))
                .collect::<Vec<_>>()
                .join(", ");
            log::warn!("Refusing to delete farm {}: still has {}", id, summary);
            return Err(DomainError::Conflict(format!("Farm {} still has {}", id, summary)));
        }
        self.farms.delete(id).await
    }
}
