//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Implementations can use the remote record store or the local key-value
//! store; callers never know which.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};

use crate::domain::{DomainError, DomainResult, Entity, Expense, Task, TaskStatus};

/// Core repository trait for CRUD operations
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Create a new entity. The store assigns the id; whatever id `entity`
    /// carries is ignored.
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// Find entity by ID. A missing id is `Ok(None)`, never an error.
    async fn find_by_id(&self, id: u32) -> DomainResult<Option<T>>;

    /// List all entities
    async fn list(&self) -> DomainResult<Vec<T>>;

    /// Replace the stored record with the same id
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Delete entity by ID. Returns whether anything was removed.
    async fn delete(&self, id: u32) -> DomainResult<bool>;

    /// Entities whose farm foreign key equals `farm_id`
    async fn list_by_farm(&self, farm_id: u32) -> DomainResult<Vec<T>> {
        let all = self.list().await?;
        Ok(all.into_iter().filter(|e| e.farm_id() == Some(farm_id)).collect())
    }

    /// Like `list_by_farm`, but a read that could not complete is an error
    /// instead of an empty list
    async fn list_by_farm_strict(&self, farm_id: u32) -> DomainResult<Vec<T>> {
        self.list_by_farm(farm_id).await
    }
}

/// Task-specific operations on top of CRUD
#[async_trait]
pub trait TaskRepository: Repository<Task> {
    /// Mark a task completed. Not atomic: read, then full update. Completing
    /// an already completed task just writes it again.
    async fn complete(&self, id: u32) -> DomainResult<Task> {
        let mut task = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Task {} not found", id)))?;
        task.status = TaskStatus::Completed;
        self.update(&task).await
    }

    /// Incomplete tasks due within `[today, today + window_days]`, both ends
    /// inclusive, compared by calendar day
    async fn upcoming(&self, window_days: u32, today: NaiveDate) -> DomainResult<Vec<Task>> {
        let tasks = self.list().await?;
        Ok(tasks
            .into_iter()
            .filter(|t| is_upcoming(t, window_days, today))
            .collect())
    }
}

/// Expense-specific operations on top of CRUD
#[async_trait]
pub trait ExpenseRepository: Repository<Expense> {
    /// Sum of amounts dated in the given calendar month
    async fn monthly_total(&self, year: i32, month: u32) -> DomainResult<f64> {
        let expenses = self.list().await?;
        Ok(expenses
            .iter()
            .filter(|e| e.in_month(year, month))
            .map(|e| e.amount)
            .sum())
    }
}

pub(crate) fn upcoming_window_end(window_days: u32, today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX)
}

pub(crate) fn is_upcoming(task: &Task, window_days: u32, today: NaiveDate) -> bool {
    !task.is_completed() && task.due_date >= today && task.due_date <= upcoming_window_end(window_days, today)
}
