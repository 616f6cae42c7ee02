//! Request-level operations. Each service resolves the addressed scope, checks
//! that it exists, then that the caller owns it, before touching collections.

pub mod task_service;
pub mod todo_service;
pub mod user_service;

use std::collections::HashMap;
use thiserror::Error;

use crate::auth::Identity;
use crate::error::ApiError;
use crate::models::{Task, Todo, User};
use crate::store::{Store, StoreError};

pub use task_service::TaskService;
pub use todo_service::TodoService;
pub use user_service::{normalize_email, SignUpRequest, UserService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("user {caller} does not own {kind} {id}")]
    NotOwner {
        caller: i64,
        kind: &'static str,
        id: i64,
    },

    #[error("invalid input: {0:?}")]
    Invalid(HashMap<String, String>),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl ServiceError {
    fn not_found(kind: &'static str, id: i64) -> Self {
        ServiceError::NotFound { kind, id }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { kind, id } => {
                ApiError::not_found(format!("{} {} not found", kind, id))
            }
            ServiceError::NotOwner { .. } => {
                tracing::warn!("{}", err);
                ApiError::forbidden("Access denied")
            }
            ServiceError::Invalid(field_errors) => {
                ApiError::validation_error("Invalid request", Some(field_errors))
            }
            ServiceError::Store(e) => e.into(),
            ServiceError::Hashing(e) => {
                tracing::error!("Password hashing failed: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

/// The user must exist and be the caller.
pub(crate) async fn owned_user(
    store: &dyn Store,
    caller: &Identity,
    user_id: i64,
) -> Result<User, ServiceError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("user", user_id))?;

    if user.id != caller.id {
        return Err(ServiceError::NotOwner {
            caller: caller.id,
            kind: "user",
            id: user_id,
        });
    }
    Ok(user)
}

/// The todo must exist and belong to the caller.
pub(crate) async fn owned_todo(
    store: &dyn Store,
    caller: &Identity,
    todo_id: i64,
) -> Result<Todo, ServiceError> {
    let todo = store
        .find_todo(todo_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("todo", todo_id))?;

    if todo.user_id != caller.id {
        return Err(ServiceError::NotOwner {
            caller: caller.id,
            kind: "todo",
            id: todo_id,
        });
    }
    Ok(todo)
}

/// The task must be live and its todo must belong to the caller.
pub(crate) async fn owned_task(
    store: &dyn Store,
    caller: &Identity,
    task_id: i64,
) -> Result<Task, ServiceError> {
    let task = store
        .find_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("task", task_id))?;

    let owner = store.find_todo(task.todo_id).await?.map(|t| t.user_id);
    if owner != Some(caller.id) {
        return Err(ServiceError::NotOwner {
            caller: caller.id,
            kind: "task",
            id: task_id,
        });
    }
    Ok(task)
}

/// Records `field` as missing when `value` is absent or blank.
pub(crate) fn required(
    field: &str,
    value: Option<String>,
    errors: &mut HashMap<String, String>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.insert(field.to_string(), format!("{} is required", field));
            None
        }
    }
}
