//! Task Entity
//!
//! Farm work item with a due date. The workflow status is the single source
//! of truth; overdue/due-soon are display tags computed elsewhere.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "Open",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Blocked => "Blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(TaskStatus::Open),
            "InProgress" => Some(TaskStatus::InProgress),
            "Completed" => Some(TaskStatus::Completed),
            "Blocked" => Some(TaskStatus::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: u32,
    pub farm_id: u32,
    /// Must belong to `farm_id` when present
    pub crop_id: Option<u32>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: u32, farm_id: u32, title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            id,
            farm_id,
            crop_id: None,
            title: title.into(),
            description: None,
            due_date,
            priority: Priority::default(),
            status: TaskStatus::default(),
            created_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Stored shape of a task.
///
/// Older records only carry `completed`; newer ones carry `status`. When both
/// are present `status` wins. `completed` is still written so that older
/// readers keep working.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    #[serde(rename = "Id", default)]
    id: u32,
    farm_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    crop_id: Option<u32>,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    due_date: NaiveDate,
    #[serde(default)]
    priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

impl From<TaskRecord> for Task {
    fn from(r: TaskRecord) -> Self {
        let status = r.status.unwrap_or(match r.completed {
            Some(true) => TaskStatus::Completed,
            _ => TaskStatus::Open,
        });
        Self {
            id: r.id,
            farm_id: r.farm_id,
            crop_id: r.crop_id,
            title: r.title,
            description: r.description,
            due_date: r.due_date,
            priority: r.priority,
            status,
            created_at: r.created_at,
        }
    }
}

impl From<Task> for TaskRecord {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            farm_id: t.farm_id,
            crop_id: t.crop_id,
            title: t.title,
            description: t.description,
            due_date: t.due_date,
            priority: t.priority,
            completed: Some(t.status == TaskStatus::Completed),
            status: Some(t.status),
            created_at: t.created_at,
        }
    }
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const KIND: &'static str = "Task";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "farmId",
        "cropId",
        "title",
        "description",
        "dueDate",
        "priority",
        "status",
        "completed",
        "createdAt",
    ];

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn farm_id(&self) -> Option<u32> {
        Some(self.farm_id)
    }

    fn on_create(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Open;
        self.created_at = Some(now);
    }

    fn keep_store_fields(&mut self, previous: &Self) {
        if self.created_at.is_none() {
            self.created_at = previous.created_at;
        }
    }
}
