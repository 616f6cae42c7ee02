// handlers/todos.rs - /todo routes

use axum::extract::State;
use chrono::Utc;

use super::extract::{Id, JsonBody, QueryParams};
use super::params::ListParams;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::models::{TaskView, TodoDetail, TodoPatch, TodoView};
use crate::query::Paginated;
use crate::server::AppState;
use crate::services::todo_service::CreateTodoRequest;
use crate::services::TodoService;

/// POST /todo/:userId
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(user_id): Id,
    JsonBody(body): JsonBody<CreateTodoRequest>,
) -> ApiResult<TodoView> {
    let todo = TodoService::new(state.store.as_ref())
        .create(&caller, user_id, body)
        .await?;
    Ok(ApiResponse::created(TodoView::new(todo, Utc::now())))
}

/// GET /todo/findAllNotCompleted/:userId
pub async fn find_not_completed(
    state: State<AppState>,
    caller: CurrentUser,
    user_id: Id,
    params: QueryParams<ListParams>,
) -> ApiResult<Paginated<TodoView>> {
    list(state, caller, user_id, params, false).await
}

/// GET /todo/findAllCompleted/:userId
pub async fn find_completed(
    state: State<AppState>,
    caller: CurrentUser,
    user_id: Id,
    params: QueryParams<ListParams>,
) -> ApiResult<Paginated<TodoView>> {
    list(state, caller, user_id, params, true).await
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(user_id): Id,
    QueryParams(params): QueryParams<ListParams>,
    completed: bool,
) -> ApiResult<Paginated<TodoView>> {
    let query = params.todo_query(user_id, completed, &state.query)?;
    let page = TodoService::new(state.store.as_ref())
        .list(&caller, &query)
        .await?;

    let now = Utc::now();
    Ok(ApiResponse::success(
        page.map(|todo| TodoView::new(todo, now)).into(),
    ))
}

/// GET /todo/:id, with live tasks
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(id): Id,
) -> ApiResult<TodoDetail> {
    let (todo, tasks) = TodoService::new(state.store.as_ref()).get(&caller, id).await?;

    let now = Utc::now();
    Ok(ApiResponse::success(TodoDetail {
        todo: TodoView::new(todo, now),
        tasks: tasks.into_iter().map(|t| TaskView::new(t, now)).collect(),
    }))
}

/// PATCH /todo/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(id): Id,
    JsonBody(patch): JsonBody<TodoPatch>,
) -> ApiResult<TodoView> {
    let todo = TodoService::new(state.store.as_ref())
        .update(&caller, id, patch)
        .await?;
    Ok(ApiResponse::success(TodoView::new(todo, Utc::now())))
}

/// DELETE /todo/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Id(id): Id,
) -> ApiResult<()> {
    TodoService::new(state.store.as_ref()).delete(&caller, id).await?;
    Ok(ApiResponse::<()>::no_content())
}
