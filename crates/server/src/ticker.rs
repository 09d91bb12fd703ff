//! Ticker selection policy.
//!
//! Selects and orders the bounded set of headlines for the scrolling
//! breaking-news ticker. Breaking articles rank above everything else;
//! within each tier, newest publication first.

use std::cmp::Ordering;

use crate::models::Article;

/// Select the ticker headline set from `articles`.
///
/// Input is expected to be published articles; unpublished ones are
/// filtered out regardless. A published article with a null `published_at`
/// violates the publication invariant: it is logged as a data-integrity
/// error and ordered by `created_at` instead of being dropped or panicking.
pub fn select_ticker(articles: &[Article], max_items: usize) -> Vec<&Article> {
    let mut candidates: Vec<&Article> = articles.iter().filter(|a| a.published).collect();

    for article in &candidates {
        if article.published_at.is_none() {
            tracing::error!(
                article_id = %article.id,
                slug = %article.slug,
                "published article has no published_at; ordering by created_at"
            );
        }
    }

    candidates.sort_by(|a, b| ticker_ordering(a, b));
    candidates.truncate(max_items);
    candidates
}

/// Breaking tier first; within a tier, `published_at` descending with
/// `created_at` as both the null fallback and the tie-break.
fn ticker_ordering(a: &Article, b: &Article) -> Ordering {
    b.is_breaking_news
        .cmp(&a.is_breaking_news)
        .then_with(|| {
            let a_ts = a.published_at.unwrap_or(a.created_at);
            let b_ts = b.published_at.unwrap_or(b.created_at);
            b_ts.cmp(&a_ts)
        })
        .then(b.created_at.cmp(&a.created_at))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn article(published: bool, breaking: bool, published_offset_mins: i64) -> Article {
        let now = Utc::now();
        Article {
            id: Uuid::now_v7(),
            title: "Judul".to_string(),
            slug: "judul".to_string(),
            content: "Isi".to_string(),
            excerpt: "Isi".to_string(),
            featured_image: None,
            published,
            published_at: published.then(|| now - Duration::minutes(published_offset_mins)),
            is_breaking_news: breaking,
            author_id: Uuid::nil(),
            category_id: Uuid::nil(),
            created_at: now - Duration::hours(1),
            updated_at: now,
        }
    }

    #[test]
    fn breaking_always_ranks_above_non_breaking() {
        // Non-breaking articles are newer than the breaking ones.
        let articles = vec![
            article(true, false, 1),
            article(true, true, 120),
            article(true, false, 2),
            article(true, true, 240),
        ];

        let ticker = select_ticker(&articles, 10);
        assert_eq!(ticker.len(), 4);
        assert!(ticker[0].is_breaking_news);
        assert!(ticker[1].is_breaking_news);
        assert!(!ticker[2].is_breaking_news);
        assert!(!ticker[3].is_breaking_news);
    }

    #[test]
    fn within_tier_newest_publication_first() {
        let articles = vec![
            article(true, true, 60),
            article(true, true, 10),
            article(true, true, 30),
        ];

        let ticker = select_ticker(&articles, 10);
        let offsets: Vec<_> = ticker.iter().map(|a| a.published_at.unwrap()).collect();
        assert!(offsets[0] > offsets[1]);
        assert!(offsets[1] > offsets[2]);
    }

    #[test]
    fn cap_is_enforced() {
        let articles: Vec<Article> = (0..25).map(|i| article(true, i % 2 == 0, i)).collect();
        assert_eq!(select_ticker(&articles, 10).len(), 10);
        assert_eq!(select_ticker(&articles, 5).len(), 5);
        assert!(select_ticker(&articles, 0).is_empty());
    }

    #[test]
    fn unpublished_articles_are_excluded() {
        let articles = vec![article(false, true, 0), article(true, false, 0)];
        let ticker = select_ticker(&articles, 10);
        assert_eq!(ticker.len(), 1);
        assert!(ticker[0].published);
    }

    #[test]
    fn ranking_holds_regardless_of_input_order() {
        let a = article(true, true, 50);
        let b = article(true, false, 1);
        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b, a];

        let t1: Vec<Uuid> = select_ticker(&forward, 10).iter().map(|x| x.id).collect();
        let t2: Vec<Uuid> = select_ticker(&backward, 10).iter().map(|x| x.id).collect();
        assert_eq!(t1, t2);
        assert!(select_ticker(&forward, 10)[0].is_breaking_news);
    }

    #[test]
    fn integrity_violation_falls_back_to_created_at() {
        let mut broken = article(true, false, 0);
        broken.published_at = None;
        broken.created_at = Utc::now();
        let ok = article(true, false, 120);

        let articles = vec![ok, broken.clone()];
        let ticker = select_ticker(&articles, 10);
        assert_eq!(ticker.len(), 2);
        // Newer created_at ranks the broken row first; no crash, no drop.
        assert_eq!(ticker[0].id, broken.id);
    }
}
