//! Task list screen

use farmlog_data::domain::{Crop, Farm, Priority, Task, TaskStatus};
use farmlog_data::repository::{Repository, TaskRepository};

use super::{mutation_failed, CancelHandle, LoadState, ScreenError};
use crate::context::AppContext;
use crate::dates::{is_due_soon, is_overdue, Clock, DUE_SOON_DAYS};
use crate::forms::{validate_task, FormValues};

/// Status filter choices offered by the task screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatusFilter {
    Completed,
    /// Anything not completed
    Pending,
    Overdue,
    DueSoon,
    /// Exact workflow status
    Is(TaskStatus),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub farm_id: Option<u32>,
    pub status: Option<TaskStatusFilter>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    fn accepts(&self, task: &Task, clock: &dyn Clock) -> bool {
        if self.farm_id.is_some_and(|id| task.farm_id != id) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        match self.status {
            None => true,
            Some(TaskStatusFilter::Completed) => task.is_completed(),
            Some(TaskStatusFilter::Pending) => !task.is_completed(),
            Some(TaskStatusFilter::Overdue) => !task.is_completed() && is_overdue(task.due_date, clock),
            Some(TaskStatusFilter::DueSoon) => {
                !task.is_completed() && is_due_soon(task.due_date, DUE_SOON_DAYS, clock)
            }
            Some(TaskStatusFilter::Is(status)) => task.status == status,
        }
    }
}

/// Completed last, then overdue first, then earliest due date. Stable.
pub fn sort_tasks(tasks: &mut [Task], clock: &dyn Clock) {
    tasks.sort_by_key(|t| (t.is_completed(), !is_overdue(t.due_date, clock), t.due_date));
}

/// Filter then sort; never touches the repositories
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter, clock: &dyn Clock) -> Vec<Task> {
    let mut visible: Vec<Task> = tasks.iter().filter(|t| filter.accepts(t, clock)).cloned().collect();
    sort_tasks(&mut visible, clock);
    visible
}

pub struct TaskList {
    ctx: AppContext,
    cancel: CancelHandle,
    pub state: LoadState,
    pub tasks: Vec<Task>,
    pub farms: Vec<Farm>,
    pub crops: Vec<Crop>,
    pub filter: TaskFilter,
}

impl TaskList {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            cancel: CancelHandle::new(),
            state: LoadState::Idle,
            tasks: Vec::new(),
            farms: Vec::new(),
            crops: Vec::new(),
            filter: TaskFilter::default(),
        }
    }

    /// Clone of the handle that abandons in-flight loads
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let ticket = self.cancel.begin();
        self.state = LoadState::Loading;

        let result = tokio::try_join!(self.ctx.tasks.list(), self.ctx.farms.list(), self.ctx.crops.list());
        if !ticket.is_current() {
            log::debug!("Discarding stale task load");
            return Err(ScreenError::Cancelled);
        }

        match result {
            Ok((tasks, farms, crops)) => {
                self.tasks = tasks;
                self.farms = farms;
                self.crops = crops;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                log::error!("Task loading error: {}", e);
                self.state = LoadState::Failed("Failed to load tasks".to_string());
                Err(ScreenError::Load {
                    message: "Failed to load tasks".to_string(),
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
            log::warn!("Reload after task change failed: {}", e);
        }
    }

    /// Tasks passing the current filter, in display order
    pub fn visible(&self) -> Vec<Task> {
        filter_tasks(&self.tasks, &self.filter, self.ctx.clock.as_ref())
    }

    pub fn farm_name(&self, farm_id: u32) -> &str {
        self.farms
            .iter()
            .find(|f| f.id == farm_id)
            .map(|f| f.name.as_str())
            .unwrap_or("Unknown Farm")
    }

    /// `None` when the task has no crop
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

    /// Crops offered in the task form once a farm is picked
    pub fn crops_for_farm(&self, farm_id: u32) -> Vec<&Crop> {
        self.crops.iter().filter(|c| c.farm_id == farm_id).collect()
    }

    /// Create (`editing == None`) or replace a task from form input
    pub async fn save(&mut self, values: &FormValues, editing: Option<u32>) -> Result<Task, ScreenError> {
        let task = validate_task(values, editing.unwrap_or(0), &self.farms, &self.crops)?;

        let result = match editing {
            Some(_) => self.ctx.tasks.update(&task).await,
            None => self.ctx.tasks.create(&task).await,
        };
        let saved = result.map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to save task", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success(match editing {
            Some(_) => "Task updated successfully",
            None => "Task created successfully",
        });
        Ok(saved)
    }

    pub async fn complete(&mut self, id: u32) -> Result<Task, ScreenError> {
        let done = self
            .ctx
            .tasks
            .complete(id)
            .await
            .map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to complete task", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success("Task completed!");
        Ok(done)
    }

    pub async fn delete(&mut self, id: u32) -> Result<bool, ScreenError> {
        let removed = self
            .ctx
            .tasks
            .delete(id)
            .await
            .map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to delete task", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success("Task deleted successfully");
        Ok(removed)
    }
}
