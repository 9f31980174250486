//! User repository
//!
//! Database operations for users, including the user → posts → comments read.

use async_trait::async_trait;
use blog_core::traits::Id;
use blog_models::{NewUser, User, UserWithPosts};
use sqlx::{PgConnection, PgPool};

use crate::{comments, posts};
use crate::repository::{not_found, Pagination, Repository, RepositoryResult};
use crate::scope::live;

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, post_count, created_at, updated_at, deleted_at";

/// User repository implementation
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE username = $1 AND {}",
            USER_COLUMNS,
            live("users")
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email = $1 AND {}",
            USER_COLUMNS,
            live("users")
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Load a user with all live posts, each carrying its live comments.
    ///
    /// Three statements regardless of row counts: the user, all of its
    /// posts, and all comments of those posts, stitched together in memory.
    /// They share one read-only snapshot so the tree is never a mix of
    /// before and after a concurrent write.
    pub async fn find_with_posts_and_comments(&self, user_id: Id) -> RepositoryResult<UserWithPosts> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND {}",
            USER_COLUMNS,
            live("users")
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found::<User>(user_id))?;

        let posts = posts::select_by_user(&mut tx, user_id).await?;
        let post_ids: Vec<Id> = posts.iter().map(|p| p.id).collect();
        let comments = comments::select_by_posts(&mut tx, &post_ids).await?;

        tx.commit().await?;

        tracing::debug!(
            user_id,
            posts = posts.len(),
            comments = comments.len(),
            "Loaded user with posts and comments"
        );

        Ok(UserWithPosts::assemble(user, posts, comments))
    }
}

/// Insert a user on an open connection
pub(crate) async fn insert(conn: &mut PgConnection, dto: &NewUser) -> RepositoryResult<User> {
    dto.check()?;

    let sql = format!(
        r#"
        INSERT INTO users (username, email, password_hash, post_count, created_at, updated_at)
        VALUES ($1, $2, $3, 0, NOW(), NOW())
        RETURNING {}
        "#,
        USER_COLUMNS
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(&dto.password_hash)
        .fetch_one(&mut *conn)
        .await?;

    tracing::debug!(user_id = user.id, username = %user.username, "Created user");
    Ok(user)
}

#[async_trait]
impl Repository<User, NewUser> for UserRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE id = $1 AND {}",
            USER_COLUMNS,
            live("users")
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY id ASC LIMIT $1 OFFSET $2",
            USER_COLUMNS,
            live("users")
        );
        let rows = sqlx::query_as::<_, User>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM users WHERE {}", live("users"));
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: NewUser) -> RepositoryResult<User> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, &dto).await
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND {})",
            live("users")
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
