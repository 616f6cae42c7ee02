//! Fixtures shared by unit tests.

use chrono::Utc;

use crate::auth::password::{hash_password, MIN_COST};
use crate::auth::{Identity, Role};
use crate::config::AppConfig;
use crate::models::{NewTask, NewTodo, NewUser, Task, Todo, User};
use crate::store::{MemoryStore, TaskStore, TodoStore, UserStore};

pub const PASSWORD: &str = "correct horse battery staple";

pub fn config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.password_cost = MIN_COST;
    config
}

pub fn identity(id: i64, role: Role) -> Identity {
    Identity {
        id,
        first_name: "Test".to_string(),
        last_name: format!("User{}", id),
        email: format!("user{}@example.com", id),
        role,
    }
}

pub struct Seeded {
    pub store: MemoryStore,
    pub alice: User,
    pub bob: User,
    pub admin: User,
}

/// A memory store holding two regular users and one admin, all sharing [`PASSWORD`].
pub async fn seeded_store() -> Seeded {
    let store = MemoryStore::new();
    let alice = add_user(&store, "Alice", "alice@example.com", Role::User).await;
    let bob = add_user(&store, "Bob", "bob@example.com", Role::User).await;
    let admin = add_user(&store, "Root", "admin@example.com", Role::Admin).await;

    Seeded { store, alice, bob, admin }
}

async fn add_user(store: &MemoryStore, first_name: &str, email: &str, role: Role) -> User {
    store
        .insert_user(NewUser {
            first_name: first_name.to_string(),
            last_name: "Example".to_string(),
            email: email.to_string(),
            password_hash: hash_password(PASSWORD, MIN_COST).expect("hash seed password"),
            role,
        })
        .await
        .expect("seed user")
}

pub async fn add_todo(store: &MemoryStore, user_id: i64, title: &str) -> Todo {
    store
        .insert_todo(NewTodo {
            user_id,
            title: title.to_string(),
            created_at: Utc::now(),
        })
        .await
        .expect("seed todo")
}

pub async fn add_task(store: &MemoryStore, todo_id: i64, description: &str) -> Task {
    store
        .insert_task(NewTask {
            todo_id,
            description: description.to_string(),
            due_date: None,
        })
        .await
        .expect("seed task")
}
