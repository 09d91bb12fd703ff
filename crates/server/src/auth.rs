//! The auth gate.
//!
//! One authentication mechanism for the whole server: credential login
//! issues an HS256 JWT carried in an HttpOnly cookie (or an
//! `Authorization: Bearer` header for API clients), and every admin
//! operation resolves the caller through [`authorize`]. The content API
//! depends only on this interface, never on a specific transport.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "pontigram_session";

/// JWT claims for a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The resolved caller: a stable author identity plus the admin capability.
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl AdminIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == crate::models::user::ROLE_ADMIN
    }
}

/// Issue a session token for `user`.
pub fn issue_token(state: &AppState, user: &User) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.clone(),
        iat: now,
        exp: now + state.config().session_ttl_hours * 3600,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config().jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign session token: {e}")))?;

    Ok(token)
}

/// Verify a session token and return its claims.
pub fn verify_token(state: &AppState, token: &str) -> AppResult<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "invalid session token");
        AppError::Unauthorized
    })?;

    Ok(data.claims)
}

/// Authenticate credentials and return the matching user.
///
/// Both the unknown-email and wrong-password cases collapse into a single
/// `Unauthorized` so the response does not reveal which accounts exist.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> AppResult<User> {
    let user = User::find_by_email(state.db(), email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.verify_password(password) {
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}

/// Resolve the caller identity from request headers.
///
/// Accepts the session cookie or a bearer token. The user is re-loaded on
/// every call so a deleted account loses access immediately.
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> AppResult<AdminIdentity> {
    let token = extract_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_token(state, &token)?;

    let user = User::find_by_id(state.db(), claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AdminIdentity {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    })
}

/// Resolve the caller and require the admin capability.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> AppResult<AdminIdentity> {
    let identity = authorize(state, headers).await?;
    if !identity.is_admin() {
        return Err(AppError::Unauthorized);
    }
    Ok(identity)
}

/// Pull a session token from the cookie or the Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(cookies) = headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
        for pair in cookies.split(';') {
            if let Some(value) = pair.trim().strip_prefix(SESSION_COOKIE) {
                if let Some(token) = value.strip_prefix('=') {
                    return Some(token.to_string());
                }
            }
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Build the Set-Cookie value for a fresh session.
pub fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        ttl_hours * 3600
    )
}

/// Build the Set-Cookie value that clears the session.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_extraction_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; pontigram_session=abc.def.ghi; lang=id"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn token_extraction_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
        assert_eq!(extract_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn cookie_takes_precedence_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("pontigram_session=fromcookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer frombearer"));
        assert_eq!(extract_token(&headers).as_deref(), Some("fromcookie"));
    }

    #[test]
    fn missing_token_yields_none() {
        assert!(extract_token(&HeaderMap::new()).is_none());
    }

    #[test]
    fn similarly_named_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("pontigram_session_old=stale"),
        );
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("tok", 24);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
