//! User model and CRUD operations.

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role granting full content-management capability.
pub const ROLE_ADMIN: &str = "ADMIN";

/// User record (author/administrator).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

impl User {
    /// Check if this user holds the admin capability.
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by email")?;

        Ok(user)
    }

    /// Create a new user.
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<Self> {
        let id = Uuid::now_v7();
        let password = hash_password(&input.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password, name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.email)
        .bind(&password)
        .bind(&input.name)
        .bind(&input.role)
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }

    /// Count admin users.
    pub async fn count_admins(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(ROLE_ADMIN)
            .fetch_one(pool)
            .await
            .context("failed to count admin users")?;

        Ok(count)
    }

    /// Bootstrap the well-known admin account on first run.
    ///
    /// A no-op when any admin already exists. Exactly one admin account must
    /// exist for the system to be usable; the content API never invents
    /// authors outside this first-run path.
    pub async fn ensure_admin(
        pool: &PgPool,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Option<Self>> {
        if Self::count_admins(pool).await? > 0 {
            return Ok(None);
        }

        let admin = Self::create(
            pool,
            CreateUser {
                email: email.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                role: ROLE_ADMIN.to_string(),
            },
        )
        .await?;

        tracing::info!(user_id = %admin.id, email = %admin.email, "bootstrapped admin account");

        Ok(Some(admin))
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.password.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.password) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
