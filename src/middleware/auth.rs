use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{AuthError, Identity, TokenService};
use crate::error::ApiError;

/// Result of running a request through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Anonymous,
    Authenticated(Identity),
}

/// Decides, per request path, whether a bearer token is required and resolves it.
pub struct AccessGate {
    tokens: Arc<TokenService>,
    bypass: Vec<String>,
}

impl AccessGate {
    pub fn new(tokens: Arc<TokenService>, bypass: &[String]) -> Self {
        let bypass = bypass
            .iter()
            .map(|p| p.trim().trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self { tokens, bypass }
    }

    /// Exact match, or the entry followed by a further path segment.
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypass.iter().any(|entry| {
            path.strip_prefix(entry.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }

    pub fn check(&self, path: &str, headers: &HeaderMap) -> Result<GateOutcome, AuthError> {
        if self.is_bypassed(path) {
            return Ok(GateOutcome::Anonymous);
        }

        let token = extract_bearer(headers)?;
        let identity = self.tokens.decode(token)?;
        Ok(GateOutcome::Authenticated(identity))
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::NotAuthenticated)?;

    let value = header.to_str().map_err(|_| AuthError::NotAuthenticated)?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::NotAuthenticated),
    }
}

/// Gate middleware: rejects the request or attaches the caller's [`Identity`].
pub async fn access_gate(
    State(gate): State<Arc<AccessGate>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    match gate.check(&path, request.headers()) {
        Ok(GateOutcome::Anonymous) => {
            debug!("Gate: {} bypassed", path);
        }
        Ok(GateOutcome::Authenticated(identity)) => {
            debug!("Gate: {} resolved user {}", path, identity.id);
            request.extensions_mut().insert(identity);
        }
        Err(err) => {
            debug!("Gate: {} rejected ({})", path, err);
            return Err(err.into());
        }
    }

    Ok(next.run(request).await)
}

/// The identity attached by [`access_gate`]. Rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::testing;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};

    fn gate() -> (AccessGate, Arc<TokenService>) {
        let config = testing::config();
        let tokens = Arc::new(TokenService::new(&config.security));
        (AccessGate::new(tokens.clone(), &config.security.bypass_paths), tokens)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn bypass_matches_at_segment_boundaries() {
        let (gate, _) = gate();
        assert!(gate.is_bypassed("/auth/login"));
        assert!(gate.is_bypassed("/auth/login/"));
        assert!(gate.is_bypassed("/health/live"));
        assert!(!gate.is_bypassed("/auth/loginx"));
        assert!(!gate.is_bypassed("/healthz"));
        assert!(!gate.is_bypassed("/todo/1"));
    }

    #[test]
    fn bypass_paths_resolve_anonymously_without_a_token() {
        let (gate, _) = gate();
        let outcome = gate.check("/user/signUp", &HeaderMap::new()).unwrap();
        assert_eq!(outcome, GateOutcome::Anonymous);
    }

    #[test]
    fn missing_or_malformed_header_is_not_authenticated() {
        let (gate, _) = gate();
        assert_eq!(
            gate.check("/todo/1", &HeaderMap::new()),
            Err(AuthError::NotAuthenticated)
        );

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(gate.check("/todo/1", &headers), Err(AuthError::NotAuthenticated));
    }

    #[test]
    fn valid_token_attaches_identity() {
        let (gate, tokens) = gate();
        let identity = testing::identity(7, Role::User);
        let token = tokens.issue(&identity).unwrap();

        let outcome = gate.check("/todo/7", &bearer(&token)).unwrap();
        assert_eq!(outcome, GateOutcome::Authenticated(identity));
    }

    #[test]
    fn expired_and_tampered_tokens_are_rejected() {
        let (gate, tokens) = gate();
        let identity = testing::identity(7, Role::User);

        let stale = tokens
            .issue_at(&identity, Utc::now() - Duration::hours(3))
            .unwrap();
        assert_eq!(gate.check("/todo/7", &bearer(&stale)), Err(AuthError::TokenExpired));

        let mut tampered = tokens.issue(&identity).unwrap();
        tampered.push('x');
        assert_eq!(gate.check("/todo/7", &bearer(&tampered)), Err(AuthError::InvalidToken));
    }
}
