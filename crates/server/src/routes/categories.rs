//! Category API routes.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{Category, CategoryWithCount, CreateCategory};
use crate::state::AppState;

/// Create the category router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/categories", get(list_categories).post(create_category))
}

// -------------------------------------------------------------------------
// Response types
// -------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ArticleCount {
    articles: i64,
}

#[derive(Debug, Serialize)]
struct CategoryResponse {
    id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    updated_at: DateTime<Utc>,
    #[serde(rename = "_count")]
    count: ArticleCount,
}

impl From<CategoryWithCount> for CategoryResponse {
    fn from(c: CategoryWithCount) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            created_at: c.created_at,
            updated_at: c.updated_at,
            count: ArticleCount {
                articles: c.article_count,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ListResponse {
    categories: Vec<CategoryResponse>,
}

#[derive(Debug, Deserialize)]
struct CategoryInput {
    name: String,
    description: Option<String>,
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// GET /api/categories
///
/// Every category with its published-article count. Public; degrades to
/// the fallback provider when the store is unreachable.
async fn list_categories(State(state): State<AppState>) -> Json<ListResponse> {
    match Category::list_with_counts(state.db()).await {
        Ok(categories) => Json(ListResponse {
            categories: categories.into_iter().map(CategoryResponse::from).collect(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "content store unreachable; serving fallback categories");
            Json(ListResponse {
                categories: state
                    .fallback()
                    .categories()
                    .into_iter()
                    .map(CategoryResponse::from)
                    .collect(),
            })
        }
    }
}

/// POST /api/categories (admin)
async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<Category>)> {
    auth::require_admin(&state, &headers).await?;

    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let create = CreateCategory {
        name,
        description: input.description,
    };

    // A lost uniqueness race gets one retry with a fresh slug; a second
    // violation means the name itself is taken.
    let category = match Category::create(state.db(), &create).await {
        Ok(category) => category,
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!(name = %create.name, "category uniqueness race, retrying once");
            Category::create(state.db(), &create).await.map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("a category with this name already exists".to_string())
                } else {
                    tracing::error!(error = %e, "category insert failed");
                    AppError::StorageUnavailable
                }
            })?
        }
        Err(e) => {
            tracing::error!(error = %e, "category insert failed");
            return Err(AppError::StorageUnavailable);
        }
    };

    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn category_response_wire_shape() {
        let response = CategoryResponse::from(CategoryWithCount {
            id: Uuid::nil(),
            name: "Olahraga".to_string(),
            slug: "olahraga".to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            article_count: 7,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["_count"]["articles"], 7);
        assert!(json.get("createdAt").is_some());
    }
}
