//! Persistence seams. Handlers and services only see these traits; the
//! backing store is chosen once at startup.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    NewTask, NewTodo, NewUser, Task, TaskField, TaskPatch, Todo, TodoField, TodoPatch, User,
};
use crate::query::{CollectionQuery, Page};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Removes the user with all of their todos and tasks.
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn find_todo(&self, id: i64) -> Result<Option<Todo>, StoreError>;

    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    async fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<Option<Todo>, StoreError>;

    /// Removes the todo and its tasks.
    async fn delete_todo(&self, id: i64) -> Result<bool, StoreError>;

    async fn query_todos(&self, query: &CollectionQuery<TodoField>) -> Result<Page<Todo>, StoreError>;
}

/// Task reads never return soft-deleted rows.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError>;

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Option<Task>, StoreError>;

    async fn soft_delete_task(&self, id: i64, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn tasks_for_todo(&self, todo_id: i64) -> Result<Vec<Task>, StoreError>;

    async fn query_tasks(&self, query: &CollectionQuery<TaskField>) -> Result<Page<Task>, StoreError>;
}

#[async_trait]
pub trait Store: UserStore + TodoStore + TaskStore {
    /// Round-trips to the backing store; used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
