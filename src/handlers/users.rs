// handlers/users.rs - sign-up and admin user management

use axum::extract::State;

use super::extract::{Id, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::User;
use crate::server::AppState;
use crate::services::{SignUpRequest, UserService};

/// POST /user/signUp
pub async fn sign_up(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignUpRequest>,
) -> ApiResult<User> {
    let user = UserService::new(state.store.as_ref(), state.password_cost).sign_up(body).await?;
    Ok(ApiResponse::created(user))
}

/// GET /user (admin)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = UserService::new(state.store.as_ref(), state.password_cost).list().await?;
    Ok(ApiResponse::success(users))
}

/// DELETE /user/:id (admin)
pub async fn delete_user(State(state): State<AppState>, Id(id): Id) -> ApiResult<()> {
    UserService::new(state.store.as_ref(), state.password_cost).delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
