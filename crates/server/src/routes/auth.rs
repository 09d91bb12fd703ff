//! Authentication routes (login, logout, current identity).

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::error::AppResult;
use crate::state::AppState;

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct IdentityResponse {
    id: Uuid,
    email: String,
    name: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    success: bool,
    user: IdentityResponse,
}

#[derive(Debug, Serialize)]
struct LogoutResponse {
    success: bool,
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let user = auth::authenticate(&state, &request.email, &request.password).await?;
    let token = auth::issue_token(&state, &user)?;

    let mut headers = HeaderMap::new();
    let cookie = auth::session_cookie(&token, state.config().session_ttl_hours);
    headers.insert(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|e| anyhow::anyhow!("failed to build session cookie: {e}"))?,
    );

    info!(user_id = %user.id, "user logged in");

    Ok((
        headers,
        Json(LoginResponse {
            success: true,
            user: IdentityResponse {
                id: user.id,
                email: user.email,
                name: user.name,
                role: user.role,
            },
        }),
    ))
}

/// POST /api/auth/logout
async fn logout() -> AppResult<(HeaderMap, Json<LogoutResponse>)> {
    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        auth::clear_session_cookie()
            .parse()
            .map_err(|e| anyhow::anyhow!("failed to build session cookie: {e}"))?,
    );

    Ok((headers, Json(LogoutResponse { success: true })))
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<IdentityResponse>> {
    let identity = auth::authorize(&state, &headers).await?;

    Ok(Json(IdentityResponse {
        id: identity.user_id,
        email: identity.email,
        name: identity.name,
        role: identity.role,
    }))
}
