use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{authorize, AuthError, Identity, Role};
use crate::error::ApiError;

/// Route layer allowing only callers whose role equals the layer's state.
///
/// Must run inside [`super::access_gate`], which attaches the identity.
pub async fn require_role(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = request.extensions().get::<Identity>();

    if let Err(err) = authorize(identity, required) {
        if let (AuthError::Forbidden { .. }, Some(identity)) = (&err, identity) {
            tracing::warn!(
                "User {} ({}) denied {}: requires '{}'",
                identity.id,
                identity.role,
                request.uri().path(),
                required
            );
        }
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
