//! Repository traits and error types
//!
//! Provides the generic read/create surface shared by the repositories and
//! the classification of store errors.

use std::fmt;

use async_trait::async_trait;
use blog_core::error::ValidationErrors;
use blog_core::traits::{Entity, Id};

/// Which integrity rule the store rejected a write with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    NotNull,
    ForeignKey,
    Check,
}

impl ConstraintKind {
    /// Map a PostgreSQL SQLSTATE of class 23 (integrity constraint violation)
    pub fn from_sqlstate(code: &str) -> Option<Self> {
        match code {
            "23505" => Some(ConstraintKind::Unique),
            "23502" => Some(ConstraintKind::NotNull),
            "23503" => Some(ConstraintKind::ForeignKey),
            "23514" => Some(ConstraintKind::Check),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::NotNull => "not-null",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("{kind} constraint violated{}: {message}", constraint_suffix(.constraint))]
    ConstraintViolation {
        kind: ConstraintKind,
        constraint: Option<String>,
        message: String,
    },

    /// A derived field could not be brought up to date; the enclosing
    /// write is rolled back with it.
    #[error("Failed to update {aggregate}: {source}")]
    AggregateUpdate {
        aggregate: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("Migration of {object} failed: {source}")]
    Migration {
        object: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

fn constraint_suffix(constraint: &Option<String>) -> String {
    match constraint {
        Some(name) => format!(" ({})", name),
        None => String::new(),
    }
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }

    pub fn is_constraint(&self, kind: ConstraintKind) -> bool {
        matches!(self, RepositoryError::ConstraintViolation { kind: k, .. } if *k == kind)
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(kind) = db_err.code().as_deref().and_then(ConstraintKind::from_sqlstate) {
                return RepositoryError::ConstraintViolation {
                    kind,
                    constraint: db_err.constraint().map(str::to_string),
                    message: db_err.message().to_string(),
                };
            }
        }
        RepositoryError::Database(err)
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// NotFound for `T` with the given id
pub fn not_found<T: Entity>(id: Id) -> RepositoryError {
    RepositoryError::NotFound(format!("{} with id {} not found", T::TYPE_NAME, id))
}

/// Base repository trait. Reads and counts only see live (not soft-deleted) rows.
#[async_trait]
pub trait Repository<T, CreateDto>: Send + Sync
where
    T: Entity + 'static,
    CreateDto: Send + 'static,
{
    /// Find an entity by ID
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<T>>;

    /// Find all entities with pagination, ordered by ID
    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<Vec<T>>;

    /// Count all entities
    async fn count(&self) -> RepositoryResult<i64>;

    /// Create a new entity
    async fn create(&self, dto: CreateDto) -> RepositoryResult<T>;

    /// Check if an entity exists
    async fn exists(&self, id: Id) -> RepositoryResult<bool>;

    /// Find an entity by ID, failing with NotFound when absent
    async fn get(&self, id: Id) -> RepositoryResult<T> {
        self.find_by_id(id).await?.ok_or_else(|| not_found::<T>(id))
    }
}

/// Pagination parameters for queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: limit.max(0),
            offset: offset.max(0),
        }
    }

    pub fn page(page: i64, per_page: i64) -> Self {
        let per_page = per_page.max(0);
        Self::new(per_page, (page.max(1) - 1).saturating_mul(per_page))
    }
}
