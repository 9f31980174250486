//! Database connection pool management
//!
//! Provides PostgreSQL connection pooling using SQLx. The `Database` handle
//! is built once at startup and passed to whatever needs the store.

use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::ConnectOptions;

pub use blog_core::config::{DatabaseConfig, LoggingConfig};

use crate::comments::CommentRepository;
use crate::posts::PostRepository;
use crate::repository::{RepositoryError, RepositoryResult};
use crate::users::UserRepository;

/// Build connect options from config.
///
/// A configured schema becomes the session `search_path` and the time zone
/// the session `TimeZone`; the client encoding is always UTF-8.
pub fn connect_options(
    config: &DatabaseConfig,
    logging: &LoggingConfig,
) -> RepositoryResult<PgConnectOptions> {
    let options = match &config.url {
        Some(url) => PgConnectOptions::from_str(url).map_err(RepositoryError::Connection)?,
        None => {
            let options = PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.username)
                .database(&config.database);
            match &config.password {
                Some(password) => options.password(password),
                None => options,
            }
        }
    };

    let mut session = vec![("TimeZone", config.timezone.clone())];
    if let Some(schema) = &config.schema {
        session.push(("search_path", schema.clone()));
    }

    Ok(options
        .options(session)
        .log_statements(parse_level(&logging.statement_level, LevelFilter::Debug))
        .log_slow_statements(
            parse_level(&logging.slow_statement_level, LevelFilter::Warn),
            Duration::from_millis(logging.slow_statement_threshold_ms),
        ))
}

fn parse_level(level: &str, fallback: LevelFilter) -> LevelFilter {
    LevelFilter::from_str(level).unwrap_or(fallback)
}

/// Database connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    ///
    /// Fails with [`RepositoryError::Connection`] if the store is unreachable.
    pub async fn connect(config: &DatabaseConfig, logging: &LoggingConfig) -> RepositoryResult<Self> {
        let options = connect_options(config, logging)?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect_with(options)
            .await
            .map_err(RepositoryError::Connection)?;

        tracing::info!(
            database = %config.display_target(),
            schema = config.schema.as_deref().unwrap_or("public"),
            max_connections = config.max_connections,
            "Database pool created"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn posts(&self) -> PostRepository {
        PostRepository::new(self.pool.clone())
    }

    pub fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.pool.clone())
    }

    /// Check if the database is reachable
    pub async fn ping(&self) -> RepositoryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::Connection)?;
        Ok(())
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}
