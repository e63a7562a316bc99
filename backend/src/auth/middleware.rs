//! Authentication middleware
//!
//! Provides the auth gate both as an extractor and as a route layer. Both
//! delegate to the configured credential strategy and reject with an
//! early return, so a protected handler never runs after a failed check.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{FromRef, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Authenticated user extracted from the request credential
///
/// Reuses the identity already established by [`auth_middleware`] when the
/// route is behind it.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let app_state = AppState::from_ref(state);
        app_state.auth().authenticate(&parts.headers).await.map_err(|e| {
            debug!(error = %e, "Rejected request credential");
            metrics::counter!("recipes_auth_rejections_total").increment(1);
            e
        })
    }
}

/// Middleware function for authentication
///
/// Use this when you need to apply auth to a group of routes via
/// `route_layer`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state
        .auth()
        .authenticate(request.headers())
        .await
        .map_err(|e| {
            debug!(error = %e, path = %request.uri().path(), "Rejected request credential");
            metrics::counter!("recipes_auth_rejections_total").increment(1);
            e
        })?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthStrategyKind;
    use crate::routes::test_support::test_config;
    use crate::state::Backends;
    use axum::extract::FromRequestParts;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn parts() -> Parts {
        let (parts, _) = axum::http::Request::new(()).into_parts();
        parts
    }

    fn state() -> AppState {
        AppState::new(test_config(AuthStrategyKind::Signed), Backends::in_memory()).unwrap()
    }

    #[tokio::test]
    async fn test_extractor_reuses_identity_from_gate() {
        let state = state();
        let mut parts = parts();
        parts.extensions.insert(AuthUser {
            username: "alice".to_string(),
        });

        // No credential header: only the stored identity can satisfy this
        let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_extractor_without_credential_is_unauthorized() {
        let state = state();
        let mut parts = parts();

        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
