use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres};
use std::time::Duration;
use tracing::{debug, info};

use super::{Store, StoreError, TaskStore, TodoStore, UserStore};
use crate::auth::Role;
use crate::config::DatabaseConfig;
use crate::models::{
    NewTask, NewTodo, NewUser, Task, TaskField, TaskPatch, Todo, TodoField, TodoPatch, User,
};
use crate::query::sql::{self, SqlParam};
use crate::query::{CollectionQuery, Page, Record};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user'
    )"#,
    r#"CREATE TABLE IF NOT EXISTS todos (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        completed BOOLEAN NOT NULL DEFAULT false,
        due_date TIMESTAMPTZ
    )"#,
    r#"CREATE TABLE IF NOT EXISTS tasks (
        id BIGSERIAL PRIMARY KEY,
        todo_id BIGINT NOT NULL REFERENCES todos(id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        completed BOOLEAN NOT NULL DEFAULT false,
        due_date TIMESTAMPTZ,
        deleted_at TIMESTAMPTZ
    )"#,
    "CREATE INDEX IF NOT EXISTS todos_user_id_idx ON todos (user_id)",
    "CREATE INDEX IF NOT EXISTS tasks_todo_id_idx ON tasks (todo_id)",
];

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed store. Foreign keys cascade deletes from users to todos to tasks.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected database pool (max_connections={})", config.max_connections);
        Ok(Self { pool })
    }

    /// Creates missing tables and indexes. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn query_page<R>(&self, query: &CollectionQuery<R::Field>) -> Result<Page<R>, StoreError>
    where
        R: Record + for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let count = sql::count::<R>(query);
        debug!("count: {} {:?}", count.query, count.params);
        let mut scalar = sqlx::query_scalar::<_, i64>(&count.query);
        for param in &count.params {
            scalar = bind_param_scalar(scalar, param);
        }
        let total_items = scalar.fetch_one(&self.pool).await?;

        let select = sql::select::<R>(query);
        debug!("select: {} {:?}", select.query, select.params);
        let mut rows = sqlx::query_as::<_, R>(&select.query);
        for param in &select.params {
            rows = bind_param_query_as(rows, param);
        }
        let items = rows.fetch_all(&self.pool).await?;

        Ok(Page::new(items, total_items.max(0) as u64, query.page))
    }
}

fn bind_param_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    param: &'q SqlParam,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match param {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

fn bind_param_scalar<'q, O>(
    q: QueryScalar<'q, Postgres, O, PgArguments>,
    param: &'q SqlParam,
) -> QueryScalar<'q, Postgres, O, PgArguments> {
    match param {
        SqlParam::Int(i) => q.bind(*i),
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Text(s) => q.bind(s.as_str()),
    }
}

fn map_unique(err: sqlx::Error, field: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Duplicate(field)
        }
        _ => StoreError::Sqlx(err),
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::Sqlx(sqlx::Error::Decode(Box::new(e))))?;
        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            password_hash: row.password_hash,
            role,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (first_name, last_name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, "email"))?;

        User::try_from(row)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn find_todo(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        Ok(sqlx::query_as::<_, Todo>("SELECT * FROM todos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_todo(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        Ok(sqlx::query_as::<_, Todo>(
            "INSERT INTO todos (user_id, title, created_at) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(todo.created_at)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_todo(&self, id: i64, patch: &TodoPatch) -> Result<Option<Todo>, StoreError> {
        Ok(sqlx::query_as::<_, Todo>(
            "UPDATE todos SET \
                title = COALESCE($2, title), \
                completed = COALESCE($3, completed), \
                due_date = CASE WHEN $4 THEN $5 ELSE due_date END \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.completed)
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_todo(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn query_todos(&self, query: &CollectionQuery<TodoField>) -> Result<Page<Todo>, StoreError> {
        self.query_page::<Todo>(query).await
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_task(&self, id: i64) -> Result<Option<Task>, StoreError> {
        Ok(
            sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, StoreError> {
        Ok(sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (todo_id, description, due_date) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(task.todo_id)
        .bind(&task.description)
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Option<Task>, StoreError> {
        Ok(sqlx::query_as::<_, Task>(
            "UPDATE tasks SET \
                description = COALESCE($2, description), \
                completed = COALESCE($3, completed), \
                due_date = CASE WHEN $4 THEN $5 ELSE due_date END \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(patch.description.as_deref())
        .bind(patch.completed)
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn soft_delete_task(&self, id: i64, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE tasks SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .bind(at)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tasks_for_todo(&self, todo_id: i64) -> Result<Vec<Task>, StoreError> {
        Ok(sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE todo_id = $1 AND deleted_at IS NULL ORDER BY id",
        )
        .bind(todo_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn query_tasks(&self, query: &CollectionQuery<TaskField>) -> Result<Page<Task>, StoreError> {
        self.query_page::<Task>(query).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
