use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::cmp::Ordering;

use super::task::TaskView;
use crate::query::{fold_cmp, Record, SortField};
use crate::status::{status, Urgency};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the due date.
    #[serde(default, deserialize_with = "super::nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TodoPatch {
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = due_date;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoField {
    Id,
    Title,
    CreatedAt,
    Completed,
    DueDate,
}

impl SortField for TodoField {
    fn column(self) -> &'static str {
        match self {
            TodoField::Id => "id",
            TodoField::Title => "title",
            TodoField::CreatedAt => "created_at",
            TodoField::Completed => "completed",
            TodoField::DueDate => "due_date",
        }
    }

    fn is_text(self) -> bool {
        self == TodoField::Title
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(TodoField::Id),
            "title" => Some(TodoField::Title),
            "date" | "createdAt" | "created_at" => Some(TodoField::CreatedAt),
            "completed" => Some(TodoField::Completed),
            "dueDate" | "due_date" => Some(TodoField::DueDate),
            _ => None,
        }
    }

    fn names() -> &'static [&'static str] {
        &["id", "title", "createdAt", "completed", "dueDate"]
    }
}

impl Record for Todo {
    type Field = TodoField;

    const TABLE: &'static str = "todos";
    const OWNER_COLUMN: &'static str = "user_id";
    const TEXT_COLUMN: &'static str = "title";

    fn id(&self) -> i64 {
        self.id
    }

    fn owner_id(&self) -> i64 {
        self.user_id
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn text(&self) -> &str {
        &self.title
    }

    fn compare_by(&self, other: &Self, field: TodoField) -> Ordering {
        match field {
            TodoField::Id => self.id.cmp(&other.id),
            TodoField::Title => fold_cmp(&self.title, &other.title),
            TodoField::CreatedAt => self.created_at.cmp(&other.created_at),
            TodoField::Completed => self.completed.cmp(&other.completed),
            TodoField::DueDate => self.due_date.cmp(&other.due_date),
        }
    }
}

/// A todo as rendered to clients, with its urgency derived at read time.
#[derive(Debug, Clone, Serialize)]
pub struct TodoView {
    #[serde(flatten)]
    pub todo: Todo,
    pub status: Urgency,
}

impl TodoView {
    pub fn new(todo: Todo, now: DateTime<Utc>) -> Self {
        let status = status(now, todo.due_date);
        Self { todo, status }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TodoDetail {
    #[serde(flatten)]
    pub todo: TodoView,
    pub tasks: Vec<TaskView>,
}
