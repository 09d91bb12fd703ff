//! Category model and CRUD operations.
//!
//! Categories are flat topical groupings. The slug is the public-facing
//! identifier and is stable once created. Deleting a category with
//! dependent articles is refused by the store (FK ON DELETE RESTRICT).

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::slug::{disambiguate, slugify};

/// Category record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Category with its denormalized published-article count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub article_count: i64,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    /// Find a category by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch category")?;

        Ok(category)
    }

    /// Find a category by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>> {
        let category = sqlx::query_as::<_, Self>("SELECT * FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(pool)
            .await
            .context("failed to fetch category by slug")?;

        Ok(category)
    }

    /// Check if a category exists.
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await
                .context("failed to check category existence")?;

        Ok(exists)
    }

    /// List all categories with their published-article counts.
    ///
    /// The count is computed per query; a reader seeing a freshly published
    /// article before the count reflects it is acceptable.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.created_at, c.updated_at,
                   COUNT(a.id) FILTER (WHERE a.published) AS article_count
            FROM categories c
            LEFT JOIN articles a ON a.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(pool)
        .await
        .context("failed to list categories")?;

        Ok(categories)
    }

    /// Create a category, deriving a unique slug from the name.
    ///
    /// Returns the raw `sqlx::Error` on a lost uniqueness race; the route
    /// layer retries once before surfacing a conflict.
    pub async fn create(pool: &PgPool, input: &CreateCategory) -> Result<Self, sqlx::Error> {
        let slug = Self::generate_unique_slug(pool, &input.name).await?;
        let id = Uuid::now_v7();

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO categories (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&slug)
        .bind(&input.description)
        .fetch_one(pool)
        .await
    }

    /// Derive a slug from `name` that is unique among existing categories.
    async fn generate_unique_slug(pool: &PgPool, name: &str) -> Result<String, sqlx::Error> {
        let base = slugify(name);

        // Escape LIKE wildcards in the base before building the pattern
        let escaped = base.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let existing: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM categories WHERE slug LIKE $1 LIMIT 200")
                .bind(format!("{escaped}%"))
                .fetch_all(pool)
                .await?;

        let existing_set: HashSet<String> = existing.into_iter().collect();
        Ok(disambiguate(&base, &existing_set))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_with_wire_field_names() {
        let category = Category {
            id: Uuid::nil(),
            name: "Olahraga".to_string(),
            slug: "olahraga".to_string(),
            description: Some("Berita olahraga".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["slug"], "olahraga");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn create_category_input() {
        let input = CreateCategory {
            name: "Politik".to_string(),
            description: None,
        };
        assert_eq!(slugify(&input.name), "politik");
    }
}
