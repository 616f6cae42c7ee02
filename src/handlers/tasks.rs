// handlers/tasks.rs - /task routes

use axum::extract::State;
use chrono::Utc;

use super::extract::{Id, JsonBody, QueryParams};
use super::params::ListParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::models::{TaskPatch, TaskView};
use crate::query::Paginated;
use crate::server::AppState;
use crate::services::task_service::CreateTaskRequest;
use crate::services::TaskService;

/// POST /task/:todoId
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(todo_id): Id,
    JsonBody(body): JsonBody<CreateTaskRequest>,
) -> ApiResult<TaskView> {
    let task = TaskService::new(state.store.as_ref())
        .create(&caller, todo_id, body)
        .await?;
    Ok(ApiResponse::created(TaskView::new(task, Utc::now())))
}

/// GET /task/:todoId
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(todo_id): Id,
    QueryParams(params): QueryParams<ListParams>,
) -> ApiResult<Paginated<TaskView>> {
    let query = params.task_query(todo_id, &state.query)?;
    let page = TaskService::new(state.store.as_ref())
        .list(&caller, &query)
        .await?;

    let now = Utc::now();
    Ok(ApiResponse::success(
        page.map(|task| TaskView::new(task, now)).into(),
    ))
}

/// GET /task/item/:id
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(id): Id,
) -> ApiResult<TaskView> {
    let task = TaskService::new(state.store.as_ref()).get(&caller, id).await?;
    Ok(ApiResponse::success(TaskView::new(task, Utc::now())))
}

/// PATCH /task/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(id): Id,
    JsonBody(patch): JsonBody<TaskPatch>,
) -> ApiResult<TaskView> {
    let task = TaskService::new(state.store.as_ref())
        .update(&caller, id, patch)
        .await?;
    Ok(ApiResponse::success(TaskView::new(task, Utc::now())))
}

/// DELETE /task/:id (soft)
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(id): Id,
) -> ApiResult<()> {
    TaskService::new(state.store.as_ref()).delete(&caller, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
