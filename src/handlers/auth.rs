// handlers/auth.rs - POST /auth/login

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::extract::JsonBody;
use crate::auth::{CredentialValidator, Identity};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::normalize_email;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Exchange email/password for a signed identity token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = normalize_email(&body.email);
    let user = CredentialValidator::new(state.store.as_ref())
        .validate(&email, &body.password)
        .await?;

    let token = state.tokens.issue(&Identity::from(&user)).map_err(|e| {
        error!("Failed to issue token for user {}: {}", user.id, e);
        ApiError::internal_server_error("Failed to issue token")
    })?;

    info!("User {} logged in", user.id);
    Ok(ApiResponse::success(LoginResponse { token }))
}
