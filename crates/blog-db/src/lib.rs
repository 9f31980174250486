//! # blog-db
//!
//! Database layer for the blog store.
//!
//! This crate provides PostgreSQL access using SQLx, including:
//!
//! - Connection pool management
//! - Declarative schema and forward-only auto-migration
//! - Repositories for users, posts and comments
//! - Lifecycle hooks keeping `users.post_count` and `posts.comment_status`
//!   in step with their child rows
//!
//! Every write that touches a derived field runs its hook inside the same
//! transaction, so a failed hook rolls the whole write back.
//!
//! ## Example
//!
//! ```ignore
//! use blog_db::{migrate, Database, DatabaseConfig, LoggingConfig};
//!
//! let config = DatabaseConfig::with_url("postgres://blog@localhost/blog");
//! let db = Database::connect(&config, &LoggingConfig::default()).await?;
//! migrate::auto_migrate(db.pool(), config.schema.as_deref()).await?;
//!
//! let tree = db.users().find_with_posts_and_comments(1).await?;
//! ```

pub mod comments;
pub mod hooks;
pub mod migrate;
pub mod pool;
pub mod posts;
pub mod repository;
pub mod schema;
pub mod scope;
pub mod seed;
pub mod users;

// Re-exports
pub use comments::CommentRepository;
pub use migrate::{auto_migrate, MigrationReport};
pub use pool::{Database, DatabaseConfig, LoggingConfig, PoolStats};
pub use posts::PostRepository;
pub use repository::{
    ConstraintKind, Pagination, Repository, RepositoryError, RepositoryResult,
};
pub use seed::{seed_demo, SeedReport};
pub use users::UserRepository;
