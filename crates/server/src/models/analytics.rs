//! Analytics event model and aggregate queries.
//!
//! Events are append-only page-view records. The raw client IP is never
//! stored; only a SHA-256 digest is kept. Writes are fire-and-forget from
//! the route layer — a failed insert must never fail the page view that
//! triggered it.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

/// Reporting period for aggregate stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    Day,
    Week,
    Month,
    Quarter,
}

impl StatsPeriod {
    /// Parse the `period` query value. Unknown values fall back to a week.
    pub fn parse(value: &str) -> Self {
        match value {
            "1d" => StatsPeriod::Day,
            "30d" => StatsPeriod::Month,
            "90d" => StatsPeriod::Quarter,
            _ => StatsPeriod::Week,
        }
    }

    /// Start of the reporting window, relative to `now`.
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days = match self {
            StatsPeriod::Day => 1,
            StatsPeriod::Week => 7,
            StatsPeriod::Month => 30,
            StatsPeriod::Quarter => 90,
        };
        now - Duration::days(days)
    }
}

/// Input for recording a page view.
#[derive(Debug, Clone)]
pub struct TrackEvent {
    pub page: String,
    pub title: Option<String>,
    pub user_agent: Option<String>,
    /// Raw client IP; hashed before storage.
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub article_id: Option<Uuid>,
}

/// A (label, count) aggregate row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CountedRow {
    pub label: String,
    pub count: i64,
}

/// A popular-article aggregate row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PopularArticle {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub views: i64,
}

/// A per-day view count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyViews {
    pub date: DateTime<Utc>,
    pub views: i64,
}

/// Aggregate stats for a reporting window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsStats {
    pub total_views: i64,
    pub unique_visitors: i64,
    pub popular_pages: Vec<CountedRow>,
    pub popular_articles: Vec<PopularArticle>,
    pub traffic_sources: Vec<CountedRow>,
    pub daily_views: Vec<DailyViews>,
}

/// Hash a client IP for privacy-preserving storage.
pub fn hash_ip(ip: &str) -> String {
    let digest = Sha256::digest(ip.as_bytes());
    hex::encode(digest)
}

/// Record a page-view event.
pub async fn record(pool: &PgPool, event: &TrackEvent) -> Result<()> {
    let id = Uuid::now_v7();
    let hashed_ip = event.ip_address.as_deref().map(hash_ip);

    sqlx::query(
        r#"
        INSERT INTO analytics (id, page, title, user_agent, ip_address, referrer, session_id, article_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(&event.page)
    .bind(&event.title)
    .bind(&event.user_agent)
    .bind(hashed_ip)
    .bind(&event.referrer)
    .bind(&event.session_id)
    .bind(event.article_id)
    .execute(pool)
    .await
    .context("failed to record analytics event")?;

    Ok(())
}

/// Compute aggregate stats for the window starting at `since`.
pub async fn stats(pool: &PgPool, since: DateTime<Utc>) -> Result<AnalyticsStats> {
    let total_views: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM analytics WHERE timestamp >= $1")
            .bind(since)
            .fetch_one(pool)
            .await
            .context("failed to count views")?;

    let unique_visitors: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT session_id) FROM analytics WHERE timestamp >= $1 AND session_id IS NOT NULL",
    )
    .bind(since)
    .fetch_one(pool)
    .await
    .context("failed to count unique visitors")?;

    let popular_pages = sqlx::query_as::<_, CountedRow>(
        r#"
        SELECT page AS label, COUNT(*) AS count
        FROM analytics
        WHERE timestamp >= $1
        GROUP BY page
        ORDER BY count DESC, label
        LIMIT 10
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("failed to aggregate popular pages")?;

    let popular_articles = sqlx::query_as::<_, PopularArticle>(
        r#"
        SELECT a.id, a.title, a.slug, COUNT(e.id) AS views
        FROM analytics e
        INNER JOIN articles a ON a.id = e.article_id
        WHERE e.timestamp >= $1
        GROUP BY a.id
        ORDER BY views DESC, a.title
        LIMIT 10
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("failed to aggregate popular articles")?;

    let traffic_sources = sqlx::query_as::<_, CountedRow>(
        r#"
        SELECT COALESCE(NULLIF(referrer, ''), 'direct') AS label, COUNT(*) AS count
        FROM analytics
        WHERE timestamp >= $1
        GROUP BY label
        ORDER BY count DESC, label
        LIMIT 10
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("failed to aggregate traffic sources")?;

    let daily_views = sqlx::query_as::<_, DailyViews>(
        r#"
        SELECT date_trunc('day', timestamp) AS date, COUNT(*) AS views
        FROM analytics
        WHERE timestamp >= $1
        GROUP BY date
        ORDER BY date
        "#,
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .context("failed to aggregate daily views")?;

    Ok(AnalyticsStats {
        total_views,
        unique_visitors,
        popular_pages,
        popular_articles,
        traffic_sources,
        daily_views,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn period_parsing() {
        assert_eq!(StatsPeriod::parse("1d"), StatsPeriod::Day);
        assert_eq!(StatsPeriod::parse("7d"), StatsPeriod::Week);
        assert_eq!(StatsPeriod::parse("30d"), StatsPeriod::Month);
        assert_eq!(StatsPeriod::parse("90d"), StatsPeriod::Quarter);
        assert_eq!(StatsPeriod::parse("nonsense"), StatsPeriod::Week);
    }

    #[test]
    fn window_start_subtracts_days() {
        let now = Utc::now();
        assert_eq!(StatsPeriod::Day.window_start(now), now - Duration::days(1));
        assert_eq!(StatsPeriod::Quarter.window_start(now), now - Duration::days(90));
    }

    #[test]
    fn ip_hashing_is_deterministic_and_opaque() {
        let a = hash_ip("203.0.113.7");
        let b = hash_ip("203.0.113.7");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, hash_ip("203.0.113.8"));
    }
}
