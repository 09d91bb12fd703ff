//! Shared application state.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::fallback::{EmptyFallback, FallbackContent};
use crate::models::User;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    db: PgPool,
    config: Arc<Config>,
    fallback: Arc<dyn FallbackContent>,
}

impl AppState {
    /// Initialize state: connect, migrate, and bootstrap the admin account.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config).await?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => {
                User::ensure_admin(&pool, email, password, &config.admin_name)
                    .await
                    .context("failed to bootstrap admin account")?;
            }
            _ => {
                if User::count_admins(&pool).await? == 0 {
                    tracing::warn!(
                        "no admin account exists and ADMIN_EMAIL/ADMIN_PASSWORD are unset; \
                         admin operations will be unusable until one is created"
                    );
                }
            }
        }

        Ok(Self {
            db: pool,
            config: Arc::new(config.clone()),
            fallback: Arc::new(EmptyFallback),
        })
    }

    /// Build state from existing parts, with an injected fallback provider.
    pub fn with_parts(
        pool: PgPool,
        config: Config,
        fallback: Arc<dyn FallbackContent>,
    ) -> Self {
        Self {
            db: pool,
            config: Arc::new(config),
            fallback,
        }
    }

    /// Database connection pool.
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Application configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Degraded-mode content provider.
    pub fn fallback(&self) -> &dyn FallbackContent {
        self.fallback.as_ref()
    }

    /// Check database connectivity.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.db).await
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish()
    }
}
