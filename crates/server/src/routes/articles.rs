//! Article API routes.
//!
//! Listing, CRUD, the breaking-news toggle, and the ticker feed.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::{get, patch};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{Article, ArticleChanges, ArticleDetail, ArticleFilter, Category, NewArticle};
use crate::publication;
use crate::state::AppState;
use crate::ticker::select_ticker;

/// Default page size.
const DEFAULT_LIMIT: i64 = 10;

/// Hard cap when `breakingOnly` is set; the ticker UI depends on this
/// overriding whatever `limit` the caller passed.
const BREAKING_LIMIT: i64 = 5;

/// Create the article router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/articles", get(list_articles).post(create_article))
        .route(
            "/api/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/api/articles/{id}/breaking", patch(set_breaking))
        .route("/api/ticker", get(get_ticker))
}

// -------------------------------------------------------------------------
// Response types
// -------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AuthorRef {
    name: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct CategoryRef {
    name: String,
    slug: String,
}

/// Article with author/category denormalized, saving callers a second
/// round trip.
#[derive(Debug, Serialize)]
struct ArticleResponse {
    #[serde(flatten)]
    article: Article,
    author: AuthorRef,
    category: CategoryRef,
}

impl From<ArticleDetail> for ArticleResponse {
    fn from(detail: ArticleDetail) -> Self {
        Self {
            article: detail.article,
            author: AuthorRef {
                name: detail.author_name,
                email: detail.author_email,
            },
            category: CategoryRef {
                name: detail.category_name,
                slug: detail.category_slug,
            },
        }
    }
}

/// Pagination envelope.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Compute the pagination envelope: `pages = ceil(total / limit)`.
pub fn paginate(page: i64, limit: i64, total: i64) -> Pagination {
    let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
    Pagination {
        page,
        limit,
        total,
        pages,
    }
}

#[derive(Debug, Serialize)]
struct ListResponse {
    articles: Vec<ArticleResponse>,
    pagination: Pagination,
}

#[derive(Debug, Serialize)]
struct TickerResponse {
    articles: Vec<Article>,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    message: String,
}

// -------------------------------------------------------------------------
// Request types
// -------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    category: Option<String>,
    search: Option<String>,
    published: Option<bool>,
    #[serde(default)]
    include_all: bool,
    #[serde(default)]
    breaking_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleInput {
    title: String,
    content: String,
    excerpt: Option<String>,
    category_id: Uuid,
    featured_image: Option<String>,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    is_breaking_news: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BreakingInput {
    is_breaking_news: bool,
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// GET /api/articles
///
/// Public callers always get the published filter; `includeAll` and an
/// explicit `published` filter are honored only for authenticated admins.
/// `breakingOnly` forces published + breaking and caps the page size at 5
/// regardless of `limit`.
async fn list_articles(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let is_admin = auth::authorize(&state, &headers)
        .await
        .map(|id| id.is_admin())
        .unwrap_or(false);

    let (filter, page, limit, offset) = resolve_listing(&query, is_admin);

    let result = async {
        let total = Article::count_filtered(state.db(), &filter).await?;
        let articles = Article::list_filtered(state.db(), &filter, limit, offset).await?;
        anyhow::Ok((total, articles))
    }
    .await;

    match result {
        Ok((total, articles)) => Json(ListResponse {
            articles: articles.into_iter().map(ArticleResponse::from).collect(),
            pagination: paginate(page, limit, total),
        }),
        Err(e) => {
            // Degraded mode: the public listing never hard-fails, but this
            // must stay visible in monitoring.
            tracing::error!(error = %e, "content store unreachable; serving fallback article list");
            let articles = state.fallback().articles();
            let total = articles.len() as i64;
            Json(ListResponse {
                articles: articles.into_iter().map(ArticleResponse::from).collect(),
                pagination: paginate(page, limit, total),
            })
        }
    }
}

/// GET /api/articles/{id}
///
/// The path segment is an article ID, or a slug when it does not parse as
/// a UUID (public pages link by slug). Drafts are only visible to admins.
async fn get_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Json<ArticleResponse>> {
    let detail = match id.parse::<Uuid>() {
        Ok(uuid) => Article::find_by_id(state.db(), uuid).await?,
        Err(_) => Article::find_by_slug(state.db(), &id).await?,
    };

    let detail = detail.ok_or(AppError::NotFound)?;

    if !detail.article.published {
        let is_admin = auth::authorize(&state, &headers)
            .await
            .map(|id| id.is_admin())
            .unwrap_or(false);
        if !is_admin {
            return Err(AppError::NotFound);
        }
    }

    Ok(Json(detail.into()))
}

/// POST /api/articles (admin)
async fn create_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ArticleInput>,
) -> AppResult<(StatusCode, Json<ArticleResponse>)> {
    let identity = auth::require_admin(&state, &headers).await?;
    validate_input(&input)?;

    if !Category::exists(state.db(), input.category_id).await? {
        return Err(AppError::NotFound);
    }

    let new_article = NewArticle {
        title: input.title.trim().to_string(),
        content: input.content.clone(),
        excerpt: resolve_excerpt(&input),
        featured_image: input.featured_image.clone(),
        published: input.published,
        published_at: publication::resolve_published_at(None, input.published, Utc::now()),
        is_breaking_news: input.is_breaking_news,
        author_id: identity.user_id,
        category_id: input.category_id,
    };

    let detail = Article::create(state.db(), &new_article)
        .await
        .map_err(map_insert_error)?;

    tracing::info!(article_id = %detail.article.id, slug = %detail.article.slug, "article created");

    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// PUT /api/articles/{id} (admin)
///
/// Same validation as create. The slug is preserved so previously shared
/// URLs keep working; `published_at` follows the publication rules (set on
/// first publish, retained otherwise).
async fn update_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(input): Json<ArticleInput>,
) -> AppResult<Json<ArticleResponse>> {
    auth::require_admin(&state, &headers).await?;
    validate_input(&input)?;

    let current = Article::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !Category::exists(state.db(), input.category_id).await? {
        return Err(AppError::NotFound);
    }

    let changes = ArticleChanges {
        title: input.title.trim().to_string(),
        content: input.content.clone(),
        excerpt: resolve_excerpt(&input),
        featured_image: input.featured_image.clone(),
        published: input.published,
        published_at: publication::resolve_published_at(
            current.article.published_at,
            input.published,
            Utc::now(),
        ),
        is_breaking_news: input.is_breaking_news,
        category_id: input.category_id,
    };

    let detail = Article::update(state.db(), id, &changes)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(detail.into()))
}

/// DELETE /api/articles/{id} (admin)
async fn delete_article(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DeleteResponse>> {
    auth::require_admin(&state, &headers).await?;

    if !Article::delete(state.db(), id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(article_id = %id, "article deleted");

    Ok(Json(DeleteResponse {
        message: "Article deleted successfully".to_string(),
    }))
}

/// PATCH /api/articles/{id}/breaking (admin)
///
/// Toggles the breaking flag without touching publication state. Marking
/// an unpublished article as breaking is rejected; clearing the flag is
/// always allowed.
async fn set_breaking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(input): Json<BreakingInput>,
) -> AppResult<Json<ArticleResponse>> {
    auth::require_admin(&state, &headers).await?;

    let current = Article::find_by_id(state.db(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    if input.is_breaking_news && !current.article.published {
        return Err(AppError::Validation(
            "cannot mark an unpublished article as breaking news".to_string(),
        ));
    }

    let detail = Article::set_breaking(state.db(), id, input.is_breaking_news)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(detail.into()))
}

/// GET /api/ticker
///
/// The bounded headline set for the scrolling ticker: breaking first,
/// newest publication first within each tier, capped by configuration.
async fn get_ticker(State(state): State<AppState>) -> Json<TickerResponse> {
    let max_items = state.config().ticker_max_items;

    match Article::list_published(state.db()).await {
        Ok(published) => {
            let articles = select_ticker(&published, max_items)
                .into_iter()
                .cloned()
                .collect();
            Json(TickerResponse { articles })
        }
        Err(e) => {
            tracing::error!(error = %e, "content store unreachable; serving fallback ticker");
            let articles = state
                .fallback()
                .articles()
                .into_iter()
                .map(|d| d.article)
                .take(max_items)
                .collect();
            Json(TickerResponse { articles })
        }
    }
}

// -------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------

/// Resolve a listing query into `(filter, page, limit, offset)`.
///
/// Public callers always get the published filter; `includeAll` and an
/// explicit `published` value are honored only for admins. `breakingOnly`
/// overrides both: the published filter stays forced and the page size is
/// capped at 5 regardless of the caller's `limit`.
fn resolve_listing(query: &ListQuery, is_admin: bool) -> (ArticleFilter, i64, i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let mut limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 100);

    let mut filter = ArticleFilter {
        category_slug: query.category.clone(),
        search: query.search.clone(),
        published: Some(true),
        breaking_only: false,
    };

    if query.breaking_only {
        filter.breaking_only = true;
        limit = BREAKING_LIMIT;
    } else if is_admin {
        if query.include_all {
            filter.published = None;
        } else if let Some(published) = query.published {
            filter.published = Some(published);
        }
    }

    let offset = (page - 1).saturating_mul(limit);

    (filter, page, limit, offset)
}

fn validate_input(input: &ArticleInput) -> AppResult<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if input.content.trim().is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    Ok(())
}

fn resolve_excerpt(input: &ArticleInput) -> String {
    match input.excerpt.as_deref().map(str::trim) {
        Some(excerpt) if !excerpt.is_empty() => excerpt.to_string(),
        _ => Article::derive_excerpt(&input.content),
    }
}

/// Map insert failures: a uniqueness violation that survived the retry is a
/// conflict; anything else means the store failed mid-write.
fn map_insert_error(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("an article with this slug already exists".to_string())
    } else {
        tracing::error!(error = %err, "article insert failed");
        AppError::StorageUnavailable
    }
}
