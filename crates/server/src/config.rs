//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// Secret for signing session JWTs.
    pub jwt_secret: String,

    /// Session token lifetime in hours (default: 24).
    pub session_ttl_hours: i64,

    /// Maximum headlines in the breaking-news ticker (default: 10).
    pub ticker_max_items: usize,

    /// Email for the bootstrapped admin account.
    pub admin_email: Option<String>,

    /// Password for the bootstrapped admin account.
    pub admin_password: Option<String>,

    /// Display name for the bootstrapped admin account (default: "Admin").
    pub admin_name: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!("JWT_SECRET not set; using an insecure development default");
                "pontigram-dev-secret".to_string()
            }
        };

        let session_ttl_hours = env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .context("SESSION_TTL_HOURS must be a valid i64")?;

        let ticker_max_items = env::var("TICKER_MAX_ITEMS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("TICKER_MAX_ITEMS must be a valid usize")?;

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();
        let admin_name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string());

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            cors_allowed_origins,
            jwt_secret,
            session_ttl_hours,
            ticker_max_items,
            admin_email,
            admin_password,
            admin_name,
        })
    }
}
