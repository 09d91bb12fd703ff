//! Analytics API routes.
//!
//! Tracking is fire-and-forget: the endpoint always reports success, even
//! when the underlying write fails or times out. A page view must never be
//! slowed down or failed by its own bookkeeping.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::analytics::{self, AnalyticsStats, StatsPeriod, TrackEvent};
use crate::state::AppState;

/// Upper bound on how long a page view waits for its event write.
const TRACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Create the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/track", post(track))
        .route("/api/analytics/stats", get(stats))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackRequest {
    page: String,
    title: Option<String>,
    article_id: Option<Uuid>,
    referrer: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct TrackResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    period: Option<String>,
}

/// POST /api/analytics/track
async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Json<TrackResponse> {
    let event = TrackEvent {
        page: request.page,
        title: request.title,
        user_agent: header_value(&headers, "user-agent"),
        ip_address: client_ip(&headers),
        referrer: request.referrer,
        session_id: request.session_id,
        article_id: request.article_id,
    };

    let outcome = tokio::time::timeout(TRACK_TIMEOUT, analytics::record(state.db(), &event)).await;

    let warning = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, page = %event.page, "analytics write failed");
            Some("event not recorded".to_string())
        }
        Err(_) => {
            tracing::warn!(page = %event.page, "analytics write timed out");
            Some("event not recorded".to_string())
        }
    };

    Json(TrackResponse {
        success: true,
        warning,
    })
}

/// GET /api/analytics/stats?period=1d|7d|30d|90d
async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<AnalyticsStats>> {
    let period = StatsPeriod::parse(query.period.as_deref().unwrap_or("7d"));
    let since = period.window_start(Utc::now());

    let stats = analytics::stats(state.db(), since).await?;

    Ok(Json(stats))
}

// -------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Best-effort client IP from proxy headers. Hashed before storage; absent
/// when the deployment sets neither header.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = header_value(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    header_value(headers, "x-real-ip")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn client_ip_absent_without_headers() {
        assert!(client_ip(&HeaderMap::new()).is_none());
    }

    #[test]
    fn track_response_omits_empty_warning() {
        let json = serde_json::to_value(TrackResponse {
            success: true,
            warning: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }
}
