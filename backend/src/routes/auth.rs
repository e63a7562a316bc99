//! Authentication routes
//!
//! Provides endpoints for signup, signin, credential refresh and sign-out.
//! The credential format (cookie or bearer token) depends on the
//! configured strategy.

use crate::auth::{AuthUser, IssuedCredential};
use crate::error::ApiResult;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use recipes_api_shared::{CredentialsRequest, MessageResponse, UserProfile};

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/refresh", post(refresh))
        .route("/signout", post(signout))
        .route("/me", get(me))
}

/// Register a new user
///
/// POST /api/v1/auth/signup
///
/// # Performance
/// Password hashing is offloaded to blocking thread pool.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<(StatusCode, IssuedCredential)> {
    let credential =
        UserService::signup(state.users(), state.passwords(), state.auth(), req).await?;
    Ok((StatusCode::CREATED, credential))
}

/// Sign in with username and password
///
/// POST /api/v1/auth/signin
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> ApiResult<IssuedCredential> {
    UserService::signin(state.users(), state.passwords(), state.auth(), req).await
}

/// Exchange the current credential for a new one
///
/// POST /api/v1/auth/refresh
async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<IssuedCredential> {
    UserService::refresh(state.auth(), &headers).await
}

/// End the current session
///
/// POST /api/v1/auth/signout
async fn signout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<impl IntoResponse> {
    let clear_cookie = UserService::sign_out(state.auth(), &headers).await?;
    Ok((
        [(header::SET_COOKIE, clear_cookie)],
        Json(MessageResponse::new("Signed out")),
    ))
}

/// Get the authenticated user
///
/// GET /api/v1/auth/me
///
/// # Authentication
/// Requires a valid credential for the configured strategy.
async fn me(auth_user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        username: auth_user.username,
    })
}
