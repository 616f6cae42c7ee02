use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;

use super::{owned_todo, owned_user, required, ServiceError};
use crate::auth::Identity;
use crate::models::{NewTodo, Task, Todo, TodoField, TodoPatch};
use crate::query::{CollectionQuery, Page};
use crate::store::Store;

#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
}

pub struct TodoService<'a> {
    store: &'a dyn Store,
}

impl<'a> TodoService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        caller: &Identity,
        user_id: i64,
        request: CreateTodoRequest,
    ) -> Result<Todo, ServiceError> {
        owned_user(self.store, caller, user_id).await?;

        let mut errors = HashMap::new();
        let Some(title) = required("title", request.title, &mut errors) else {
            return Err(ServiceError::Invalid(errors));
        };

        let todo = self
            .store
            .insert_todo(NewTodo {
                user_id,
                title,
                created_at: Utc::now(),
            })
            .await?;
        tracing::debug!("User {} created todo {}", caller.id, todo.id);
        Ok(todo)
    }

    /// One page of the owner's todos. `query.owner_id` is the user being listed.
    pub async fn list(
        &self,
        caller: &Identity,
        query: &CollectionQuery<TodoField>,
    ) -> Result<Page<Todo>, ServiceError> {
        owned_user(self.store, caller, query.owner_id).await?;
        Ok(self.store.query_todos(query).await?)
    }

    /// The todo with its live tasks in id order.
    pub async fn get(&self, caller: &Identity, id: i64) -> Result<(Todo, Vec<Task>), ServiceError> {
        let todo = owned_todo(self.store, caller, id).await?;
        let tasks = self.store.tasks_for_todo(id).await?;
        Ok((todo, tasks))
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: i64,
        patch: TodoPatch,
    ) -> Result<Todo, ServiceError> {
        owned_todo(self.store, caller, id).await?;

        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                let mut errors = HashMap::new();
                errors.insert("title".to_string(), "title must not be empty".to_string());
                return Err(ServiceError::Invalid(errors));
            }
        }

        self.store
            .update_todo(id, &patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("todo", id))
    }

    pub async fn delete(&self, caller: &Identity, id: i64) -> Result<(), ServiceError> {
        owned_todo(self.store, caller, id).await?;
        if !self.store.delete_todo(id).await? {
            return Err(ServiceError::not_found("todo", id));
        }
        Ok(())
    }
}
