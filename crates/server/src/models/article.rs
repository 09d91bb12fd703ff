//! Article model and CRUD operations.
//!
//! Articles are the core content records. The slug is derived from the
//! title on create only — edits never regenerate it, so shared URLs stay
//! valid. Uniqueness is enforced by the store; inserts retry once with a
//! fresh disambiguator before surfacing a conflict.

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::is_unique_violation;
use crate::slug::{disambiguate, slugify};

/// Maximum length of a derived excerpt, before the trailing ellipsis.
const EXCERPT_MAX_CHARS: usize = 200;

/// Article record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub is_breaking_news: bool,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Article row joined with its author and category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleDetail {
    #[sqlx(flatten)]
    pub article: Article,
    pub author_name: String,
    pub author_email: String,
    pub category_name: String,
    pub category_slug: String,
}

/// Listing filter.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    /// Restrict to a category by its public slug.
    pub category_slug: Option<String>,
    /// Case-insensitive substring match over title/content/excerpt.
    pub search: Option<String>,
    /// Publication filter; `None` returns both states (admin includeAll).
    pub published: Option<bool>,
    /// Breaking-news tier only.
    pub breaking_only: bool,
}

/// Resolved values for inserting a new article.
///
/// Validation, excerpt derivation, and `published_at` resolution happen in
/// the route layer before this record is built; the slug is derived here.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub is_breaking_news: bool,
    pub author_id: Uuid,
    pub category_id: Uuid,
}

/// Resolved values for updating an article. The slug is never touched.
#[derive(Debug, Clone)]
pub struct ArticleChanges {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub is_breaking_news: bool,
    pub category_id: Uuid,
}

const DETAIL_SELECT: &str = r#"
    SELECT a.*, u.name AS author_name, u.email AS author_email,
           c.name AS category_name, c.slug AS category_slug
    FROM articles a
    INNER JOIN users u ON u.id = a.author_id
    INNER JOIN categories c ON c.id = a.category_id
"#;

/// Stable listing order: newest publication first, creation time as the
/// tie-break so bulk-seeded articles with identical `published_at` never
/// reorder between queries. Drafts (null `published_at`) sort last.
const DETAIL_ORDER: &str = " ORDER BY a.published_at DESC NULLS LAST, a.created_at DESC";

impl Article {
    /// Derive an excerpt by truncating content to ~200 characters.
    pub fn derive_excerpt(content: &str) -> String {
        let trimmed = content.trim();
        if trimmed.chars().count() <= EXCERPT_MAX_CHARS {
            return trimmed.to_string();
        }

        let truncated: String = trimmed.chars().take(EXCERPT_MAX_CHARS).collect();
        format!("{}...", truncated.trim_end())
    }

    /// Find an article (with author/category) by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ArticleDetail>> {
        let query = format!("{DETAIL_SELECT} WHERE a.id = $1");
        let article = sqlx::query_as::<_, ArticleDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch article by id")?;

        Ok(article)
    }

    /// Find an article (with author/category) by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<ArticleDetail>> {
        let query = format!("{DETAIL_SELECT} WHERE a.slug = $1");
        let article = sqlx::query_as::<_, ArticleDetail>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("failed to fetch article by slug")?;

        Ok(article)
    }

    /// List articles matching `filter` with pagination.
    pub async fn list_filtered(
        pool: &PgPool,
        filter: &ArticleFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ArticleDetail>> {
        let (clause, binds) = build_filter_clause(filter, 1);
        let query = format!(
            "{DETAIL_SELECT} WHERE 1=1{clause}{DETAIL_ORDER} LIMIT ${} OFFSET ${}",
            binds + 1,
            binds + 2
        );

        let mut query_builder = sqlx::query_as::<_, ArticleDetail>(&query);
        query_builder = bind_filter(query_builder, filter);
        query_builder = query_builder.bind(limit).bind(offset);

        let articles = query_builder
            .fetch_all(pool)
            .await
            .context("failed to list articles")?;

        Ok(articles)
    }

    /// Count articles matching `filter`.
    pub async fn count_filtered(pool: &PgPool, filter: &ArticleFilter) -> Result<i64> {
        let (clause, _) = build_filter_clause(filter, 1);
        let query = format!(
            r#"
            SELECT COUNT(*)
            FROM articles a
            INNER JOIN categories c ON c.id = a.category_id
            WHERE 1=1{clause}
            "#
        );

        let mut query_builder = sqlx::query_scalar::<_, i64>(&query);
        query_builder = bind_filter_scalar(query_builder, filter);

        let count = query_builder
            .fetch_one(pool)
            .await
            .context("failed to count articles")?;

        Ok(count)
    }

    /// List every published article, for ticker selection.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<Self>> {
        let articles = sqlx::query_as::<_, Self>(
            "SELECT * FROM articles WHERE published ORDER BY published_at DESC NULLS LAST, created_at DESC",
        )
        .fetch_all(pool)
        .await
        .context("failed to list published articles")?;

        Ok(articles)
    }

    /// Insert a new article, deriving a unique slug from the title.
    ///
    /// A concurrent create can win the race between the uniqueness probe and
    /// the insert; the store rejects the duplicate and this retries once
    /// with a freshly disambiguated slug before giving up.
    pub async fn create(pool: &PgPool, input: &NewArticle) -> Result<ArticleDetail, sqlx::Error> {
        let slug = Self::generate_unique_slug(pool, &input.title).await?;
        match Self::insert(pool, input, &slug).await {
            Ok(detail) => Ok(detail),
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(slug = %slug, "slug collision on insert, retrying once");
                let slug = Self::generate_unique_slug(pool, &input.title).await?;
                Self::insert(pool, input, &slug).await
            }
            Err(e) => Err(e),
        }
    }

    async fn insert(
        pool: &PgPool,
        input: &NewArticle,
        slug: &str,
    ) -> Result<ArticleDetail, sqlx::Error> {
        let id = Uuid::now_v7();

        sqlx::query(
            r#"
            INSERT INTO articles
                (id, title, slug, content, excerpt, featured_image,
                 published, published_at, is_breaking_news, author_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(slug)
        .bind(&input.content)
        .bind(&input.excerpt)
        .bind(&input.featured_image)
        .bind(input.published)
        .bind(input.published_at)
        .bind(input.is_breaking_news)
        .bind(input.author_id)
        .bind(input.category_id)
        .execute(pool)
        .await?;

        let query = format!("{DETAIL_SELECT} WHERE a.id = $1");
        sqlx::query_as::<_, ArticleDetail>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Update an article. The slug is preserved.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        changes: &ArticleChanges,
    ) -> Result<Option<ArticleDetail>> {
        let result = sqlx::query(
            r#"
            UPDATE articles SET
                title = $1,
                content = $2,
                excerpt = $3,
                featured_image = $4,
                published = $5,
                published_at = $6,
                is_breaking_news = $7,
                category_id = $8,
                updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.excerpt)
        .bind(&changes.featured_image)
        .bind(changes.published)
        .bind(changes.published_at)
        .bind(changes.is_breaking_news)
        .bind(changes.category_id)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update article")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Set the breaking-news flag. Publication state is never touched.
    pub async fn set_breaking(
        pool: &PgPool,
        id: Uuid,
        is_breaking: bool,
    ) -> Result<Option<ArticleDetail>> {
        let result = sqlx::query(
            "UPDATE articles SET is_breaking_news = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(is_breaking)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to set breaking flag")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Self::find_by_id(pool, id).await
    }

    /// Hard-delete an article.
    ///
    /// Analytics rows referencing it are detached (`ON DELETE SET NULL`)
    /// rather than removed, so aggregate queries stay intact.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete article")?;

        Ok(result.rows_affected() > 0)
    }

    /// Derive a slug from `title` that is unique among existing articles,
    /// regardless of published state.
    async fn generate_unique_slug(pool: &PgPool, title: &str) -> Result<String, sqlx::Error> {
        let base = slugify(title);

        // Escape LIKE wildcards in the base before building the pattern
        let escaped = base.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let existing: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM articles WHERE slug LIKE $1 LIMIT 200")
                .bind(format!("{escaped}%"))
                .fetch_all(pool)
                .await?;

        let existing_set: HashSet<String> = existing.into_iter().collect();
        Ok(disambiguate(&base, &existing_set))
    }
}

/// Build the dynamic `AND ...` clause for a filter, returning the clause and
/// the number of bind parameters it consumed. Placeholders start at `first`.
fn build_filter_clause(filter: &ArticleFilter, first: usize) -> (String, usize) {
    let mut clause = String::new();
    let mut idx = first;

    if filter.category_slug.is_some() {
        clause.push_str(&format!(" AND c.slug = ${idx}"));
        idx += 1;
    }
    if filter.search.is_some() {
        clause.push_str(&format!(
            " AND (a.title ILIKE ${idx} OR a.content ILIKE ${idx} OR a.excerpt ILIKE ${idx})"
        ));
        idx += 1;
    }
    if filter.published.is_some() {
        clause.push_str(&format!(" AND a.published = ${idx}"));
        idx += 1;
    }
    if filter.breaking_only {
        clause.push_str(" AND a.is_breaking_news = TRUE");
    }

    (clause, idx - first)
}

/// Escape LIKE/ILIKE wildcards in a user-supplied search string.
fn like_pattern(search: &str) -> String {
    let escaped = search.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

fn bind_filter<'q>(
    mut query: sqlx::query::QueryAs<'q, sqlx::Postgres, ArticleDetail, sqlx::postgres::PgArguments>,
    filter: &'q ArticleFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, ArticleDetail, sqlx::postgres::PgArguments> {
    if let Some(ref slug) = filter.category_slug {
        query = query.bind(slug);
    }
    if let Some(ref search) = filter.search {
        query = query.bind(like_pattern(search));
    }
    if let Some(published) = filter.published {
        query = query.bind(published);
    }
    query
}

fn bind_filter_scalar<'q>(
    mut query: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    filter: &'q ArticleFilter,
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    if let Some(ref slug) = filter.category_slug {
        query = query.bind(slug);
    }
    if let Some(ref search) = filter.search {
        query = query.bind(like_pattern(search));
    }
    if let Some(published) = filter.published {
        query = query.bind(published);
    }
    query
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_short_content_passes_through() {
        assert_eq!(Article::derive_excerpt("Short body."), "Short body.");
    }

    #[test]
    fn excerpt_long_content_is_truncated_with_ellipsis() {
        let content = "kata ".repeat(100);
        let excerpt = Article::derive_excerpt(&content);
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= EXCERPT_MAX_CHARS + 3);
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let content = "é".repeat(300);
        let excerpt = Article::derive_excerpt(&content);
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS + 3);
    }

    #[test]
    fn filter_clause_numbering() {
        let filter = ArticleFilter {
            category_slug: Some("olahraga".to_string()),
            search: Some("banjir".to_string()),
            published: Some(true),
            breaking_only: true,
        };

        let (clause, binds) = build_filter_clause(&filter, 1);
        assert_eq!(binds, 3);
        assert!(clause.contains("c.slug = $1"));
        assert!(clause.contains("a.title ILIKE $2"));
        assert!(clause.contains("a.published = $3"));
        assert!(clause.contains("a.is_breaking_news = TRUE"));
    }

    #[test]
    fn empty_filter_has_no_binds() {
        let (clause, binds) = build_filter_clause(&ArticleFilter::default(), 1);
        assert_eq!(binds, 0);
        assert!(clause.is_empty());
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[test]
    fn article_serializes_with_wire_field_names() {
        let article = Article {
            id: Uuid::nil(),
            title: "Judul".to_string(),
            slug: "judul".to_string(),
            content: "Isi".to_string(),
            excerpt: "Isi".to_string(),
            featured_image: None,
            published: true,
            published_at: Some(Utc::now()),
            is_breaking_news: false,
            author_id: Uuid::nil(),
            category_id: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&article).unwrap();
        assert!(json.get("isBreakingNews").is_some());
        assert!(json.get("publishedAt").is_some());
        assert!(json.get("featuredImage").is_some());
        assert!(json.get("authorId").is_some());
        assert!(json.get("is_breaking_news").is_none());
    }
}
