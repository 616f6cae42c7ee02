use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{Store, StoreError, TaskStore, TodoStore, UserStore};
use crate::models::{
    NewTask, NewTodo, NewUser, Task, TaskField, TaskPatch, Todo, TodoField, TodoPatch, User,
};
use crate::query::{self, CollectionQuery, Page};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    todos: BTreeMap<i64, Todo>,
    tasks: BTreeMap<i64, Task>,
    user_seq: i64,
    todo_seq: i64,
    task_seq: i64,
}

/// Process-local store. Ids are assigned from per-table sequences, so id order
/// is insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let id = next(&mut tables.user_seq);
        let user = User {
            id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }

        let todo_ids: Vec<i64> = tables
            .todos
            .values()
            .filter(|t| t.user_id == id)
            .map(|t| t.id)
            .collect();
        tables.todos.retain(|_, t| t.user_id != id);
        tables.tasks.retain(|_, t| !todo_ids.contains(&t.todo_id));
        Ok(true)
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn find_todo(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        Ok(self.tables.read().await.todos.get(&id).cloned())
    }

    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let mut tables = self.tables.write().await;
        let id = next(&mut tables.todo_seq);
        let todo = Todo {
            id,
            user_id: todo.user_id,
            title: todo.title,
            created_at: todo.created_at,
            completed: false,
            due_date: None,
        };
        tables.todos.insert(id, todo.clone());
        Ok(todo)
    }

    async fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<Option<Todo>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.todos.get_mut(&id).map(|todo| {
            patch.apply(todo);
            todo.clone()
        }))
    }

    async fn delete_todo(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.todos.remove(&id).is_none() {
            return Ok(false);
        }
        tables.tasks.retain(|_, t| t.todo_id != id);
        Ok(true)
    }

    async fn query_todos(&self, query: &CollectionQuery<TodoField>) -> Result<Page<Todo>, StoreError> {
        let tables = self.tables.read().await;
        Ok(query::execute(tables.todos.values(), query))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.get(&id).filter(|t| t.deleted_at.is_none()).cloned())
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        let id = next(&mut tables.task_seq);
        let task = Task {
            id,
            todo_id: task.todo_id,
            description: task.description,
            completed: false,
            due_date: task.due_date,
            deleted_at: None,
        };
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .tasks
            .get_mut(&id)
            .filter(|t| t.deleted_at.is_none())
            .map(|task| {
                patch.apply(task);
                task.clone()
            }))
    }

    async fn soft_delete_task(&self, id: i64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.tasks.get_mut(&id) {
            Some(task) if task.deleted_at.is_none() => {
                task.deleted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn tasks_for_todo(&self, todo_id: i64) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|t| t.todo_id == todo_id && t.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn query_tasks(&self, query: &CollectionQuery<TaskField>) -> Result<Page<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(query::execute(tables.tasks.values(), query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::query::PageRequest;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: email.to_string(),
            password_hash: "sha256$x$y".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.insert_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }

    #[tokio::test]
    async fn deleting_a_user_cascades() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();
        let todo = store
            .insert_todo(NewTodo { user_id: user.id, title: "t".to_string(), created_at: Utc::now() })
            .await
            .unwrap();
        let task = store
            .insert_task(NewTask { todo_id: todo.id, description: "d".to_string(), due_date: None })
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.find_todo(todo.id).await.unwrap().is_none());
        assert!(store.find_task(task.id).await.unwrap().is_none());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn soft_deleted_tasks_drop_out_of_every_read() {
        let store = MemoryStore::new();
        let task = store
            .insert_task(NewTask { todo_id: 1, description: "d".to_string(), due_date: None })
            .await
            .unwrap();

        assert!(store.soft_delete_task(task.id, Utc::now()).await.unwrap());
        assert!(!store.soft_delete_task(task.id, Utc::now()).await.unwrap());
        assert!(store.find_task(task.id).await.unwrap().is_none());
        assert!(store.tasks_for_todo(1).await.unwrap().is_empty());
        assert!(store.update_task(task.id, &TaskPatch::default()).await.unwrap().is_none());

        let page = store
            .query_tasks(&CollectionQuery::new(1, PageRequest::new(1, 10).unwrap()))
            .await
            .unwrap();
        assert_eq!(page.total_items, 0);
    }
}
