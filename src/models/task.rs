use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;

use crate::query::{fold_cmp, Record, SortField};
use crate::status::{status, Urgency};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub todo_id: i64,
    pub description: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub todo_id: i64,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub description: Option<String>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the due date.
    #[serde(default, deserialize_with = "super::nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Id,
    Description,
    Completed,
    DueDate,
}

impl SortField for TaskField {
    fn column(self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::Description => "description",
            TaskField::Completed => "completed",
            TaskField::DueDate => "due_date",
        }
    }

    fn is_text(self) -> bool {
        self == TaskField::Description
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(TaskField::Id),
            "description" => Some(TaskField::Description),
            "completed" => Some(TaskField::Completed),
            "dueDate" | "due_date" => Some(TaskField::DueDate),
            _ => None,
        }
    }

    fn names() -> &'static [&'static str] {
        &["id", "description", "completed", "dueDate"]
    }
}

impl Record for Task {
    type Field = TaskField;

    const TABLE: &'static str = "tasks";
    const OWNER_COLUMN: &'static str = "todo_id";
    const TEXT_COLUMN: &'static str = "description";
    const LIVE_PREDICATE: Option<&'static str> = Some("\"deleted_at\" IS NULL");

    fn id(&self) -> i64 {
        self.id
    }

    fn owner_id(&self) -> i64 {
        self.todo_id
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn text(&self) -> &str {
        &self.description
    }

    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn compare_by(&self, other: &Self, field: TaskField) -> Ordering {
        match field {
            TaskField::Id => self.id.cmp(&other.id),
            TaskField::Description => fold_cmp(&self.description, &other.description),
            TaskField::Completed => self.completed.cmp(&other.completed),
            TaskField::DueDate => self.due_date.cmp(&other.due_date),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub status: Urgency,
}

impl TaskView {
    pub fn new(task: Task, now: DateTime<Utc>) -> Self {
        let status = status(now, task.due_date);
        Self { task, status }
    }
}
