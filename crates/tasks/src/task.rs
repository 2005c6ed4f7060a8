use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocky_core::{DomainError, Entity, TaskId, UserId};

/// Default display color for new tasks.
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Task priority. Wire names follow the legacy vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Alta,
    #[default]
    Media,
    Baja,
}

/// A task belongs to exactly one user; every operation is owner-scoped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub description: String,
    pub completed: bool,
    pub priority: TaskPriority,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    pub description: String,
    pub priority: Option<TaskPriority>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<TaskPriority>,
    pub color: Option<String>,
}

impl Task {
    pub fn create(owner: UserId, new: NewTask, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let description = new.description.trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }
        Ok(Self {
            id: TaskId::new(),
            user_id: owner,
            description,
            completed: false,
            priority: new.priority.unwrap_or_default(),
            color: new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            created_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: TaskPatch) -> Result<(), DomainError> {
        if let Some(description) = patch.description {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(DomainError::validation("description cannot be empty"));
            }
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        Ok(())
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
