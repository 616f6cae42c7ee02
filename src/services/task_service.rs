use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::{owned_task, owned_todo, required, ServiceError};
use crate::auth::Identity;
use crate::models::{NewTask, Task, TaskField, TaskPatch};
use crate::query::{CollectionQuery, Page};
use crate::store::Store;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

pub struct TaskService<'a> {
    store: &'a dyn Store,
}

impl<'a> TaskService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        caller: &Identity,
        todo_id: i64,
        request: CreateTaskRequest,
    ) -> Result<Task, ServiceError> {
        owned_todo(self.store, caller, todo_id).await?;

        let mut errors = HashMap::new();
        let Some(description) = required("description", request.description, &mut errors) else {
            return Err(ServiceError::Invalid(errors));
        };

        Ok(self
            .store
            .insert_task(NewTask {
                todo_id,
                description,
                due_date: request.due_date,
            })
            .await?)
    }

    /// One page of a todo's live tasks. `query.owner_id` is the todo id.
    pub async fn list(
        &self,
        caller: &Identity,
        query: &CollectionQuery<TaskField>,
    ) -> Result<Page<Task>, ServiceError> {
        owned_todo(self.store, caller, query.owner_id).await?;
        Ok(self.store.query_tasks(query).await?)
    }

    pub async fn get(&self, caller: &Identity, id: i64) -> Result<Task, ServiceError> {
        owned_task(self.store, caller, id).await
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: i64,
        patch: TaskPatch,
    ) -> Result<Task, ServiceError> {
        owned_task(self.store, caller, id).await?;

        if patch.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            let mut errors = HashMap::new();
            errors.insert(
                "description".to_string(),
                "description must not be empty".to_string(),
            );
            return Err(ServiceError::Invalid(errors));
        }

        self.store
            .update_task(id, &patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("task", id))
    }

    /// Marks the task deleted; it disappears from every later read.
    pub async fn delete(&self, caller: &Identity, id: i64) -> Result<(), ServiceError> {
        owned_task(self.store, caller, id).await?;
        if !self.store.soft_delete_task(id, Utc::now()).await? {
            return Err(ServiceError::not_found("task", id));
        }
        Ok(())
    }
}
