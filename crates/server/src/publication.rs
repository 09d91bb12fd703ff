//! Publication state engine.
//!
//! Pure state-transition and visibility rules over in-memory [`Article`]
//! records, shared by the create/update routes and the SQL ordering. The
//! rules:
//!
//! - `published = true` implies `published_at` is non-null and <= now.
//! - Re-publishing never bumps `published_at`; the first publish timestamp
//!   sticks.
//! - Unpublishing retains `published_at` as "last published at". Visibility
//!   never consults the timestamp alone, so a stale value cannot leak an
//!   unpublished article.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::Article;

/// Who is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// Anonymous reader; sees published articles only.
    Public,
    /// Authenticated admin; `include_all` bypasses the published filter.
    Admin { include_all: bool },
}

/// Resolve the effective `published_at` for a publication transition.
///
/// Publishing sets the timestamp only when none exists; unpublishing
/// retains it. Used identically by the create and update paths so the two
/// can never diverge.
pub fn resolve_published_at(
    current: Option<DateTime<Utc>>,
    published: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if published {
        Some(current.unwrap_or(now))
    } else {
        current
    }
}

/// Publish an article. Idempotent: re-publish keeps the first timestamp.
pub fn publish(article: &mut Article, now: DateTime<Utc>) {
    article.published = true;
    article.published_at = resolve_published_at(article.published_at, true, now);
}

/// Unpublish an article, retaining `published_at` as last-published-at.
pub fn unpublish(article: &mut Article) {
    article.published = false;
}

/// Whether `caller` may see `article`.
pub fn is_visible(article: &Article, caller: Caller) -> bool {
    match caller {
        Caller::Public => article.published,
        Caller::Admin { include_all } => include_all || article.published,
    }
}

/// Stable listing order: `published_at` descending, `created_at` descending
/// as the tie-break. Articles with identical `published_at` (bulk seeds)
/// never reorder between queries. Mirrors the SQL `ORDER BY`.
pub fn visible_ordering(a: &Article, b: &Article) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then(b.created_at.cmp(&a.created_at))
}

/// Filter and order `articles` for `caller`.
pub fn list_visible<'a>(articles: &'a [Article], caller: Caller) -> Vec<&'a Article> {
    let mut visible: Vec<&Article> = articles
        .iter()
        .filter(|a| is_visible(a, caller))
        .collect();
    visible.sort_by(|a, b| visible_ordering(a, b));
    visible
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn draft(created_offset_secs: i64) -> Article {
        let now = Utc::now();
        Article {
            id: Uuid::now_v7(),
            title: "Judul".to_string(),
            slug: "judul".to_string(),
            content: "Isi".to_string(),
            excerpt: "Isi".to_string(),
            featured_image: None,
            published: false,
            published_at: None,
            is_breaking_news: false,
            author_id: Uuid::nil(),
            category_id: Uuid::nil(),
            created_at: now + Duration::seconds(created_offset_secs),
            updated_at: now,
        }
    }

    #[test]
    fn publish_sets_timestamp_once() {
        let mut article = draft(0);
        let first = Utc::now();
        publish(&mut article, first);
        assert!(article.published);
        assert_eq!(article.published_at, Some(first));

        // Re-publish later must not bump the timestamp.
        publish(&mut article, first + Duration::hours(1));
        assert_eq!(article.published_at, Some(first));
    }

    #[test]
    fn unpublish_retains_last_published_at() {
        let mut article = draft(0);
        let t = Utc::now();
        publish(&mut article, t);
        unpublish(&mut article);
        assert!(!article.published);
        assert_eq!(article.published_at, Some(t));

        // Publish again: still the original timestamp.
        publish(&mut article, t + Duration::hours(2));
        assert_eq!(article.published_at, Some(t));
    }

    #[test]
    fn visibility_by_caller() {
        let mut article = draft(0);
        assert!(!is_visible(&article, Caller::Public));
        assert!(!is_visible(&article, Caller::Admin { include_all: false }));
        assert!(is_visible(&article, Caller::Admin { include_all: true }));

        publish(&mut article, Utc::now());
        assert!(is_visible(&article, Caller::Public));
        assert!(is_visible(&article, Caller::Admin { include_all: false }));
    }

    #[test]
    fn list_visible_never_leaks_drafts_to_public() {
        let mut published = draft(0);
        publish(&mut published, Utc::now());
        let articles = vec![draft(1), published, draft(2)];

        let visible = list_visible(&articles, Caller::Public);
        assert_eq!(visible.len(), 1);
        assert!(visible[0].published);

        let all = list_visible(&articles, Caller::Admin { include_all: true });
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn ordering_is_newest_first_with_created_tiebreak() {
        let now = Utc::now();
        let mut older = draft(0);
        publish(&mut older, now - Duration::hours(2));
        let mut newer = draft(0);
        publish(&mut newer, now);

        // Same published_at, different created_at: later creation wins.
        let mut tie_a = draft(0);
        publish(&mut tie_a, now - Duration::hours(1));
        let mut tie_b = draft(60);
        publish(&mut tie_b, now - Duration::hours(1));

        let articles = vec![older.clone(), tie_a.clone(), newer.clone(), tie_b.clone()];
        let visible = list_visible(&articles, Caller::Public);

        assert_eq!(visible[0].id, newer.id);
        assert_eq!(visible[1].id, tie_b.id);
        assert_eq!(visible[2].id, tie_a.id);
        assert_eq!(visible[3].id, older.id);
    }

    #[test]
    fn ordering_is_stable_across_repeated_sorts() {
        let now = Utc::now();
        let mut seeded: Vec<Article> = (0..20)
            .map(|i| {
                let mut a = draft(i);
                publish(&mut a, now);
                a
            })
            .collect();
        seeded.reverse();

        let first: Vec<Uuid> = list_visible(&seeded, Caller::Public).iter().map(|a| a.id).collect();
        let second: Vec<Uuid> = list_visible(&seeded, Caller::Public).iter().map(|a| a.id).collect();
        assert_eq!(first, second);
    }
}
