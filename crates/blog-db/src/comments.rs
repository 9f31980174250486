//! Comment repository
//!
//! Every write here changes the set of live comments of some post, so each
//! one recomputes that post's `comment_status` before committing.

use async_trait::async_trait;
use blog_core::traits::Id;
use blog_models::{Comment, NewComment};
use sqlx::{PgConnection, PgPool};

use crate::hooks;
use crate::repository::{not_found, Pagination, Repository, RepositoryResult};
use crate::scope::{deleted, live, MARK_DELETED, MARK_RESTORED};

pub(crate) const COMMENT_COLUMNS: &str =
    "id, content, post_id, user_id, created_at, updated_at, deleted_at";

/// Comment repository implementation
#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Live comments of a post, oldest first
    pub async fn find_by_post(&self, post_id: Id) -> RepositoryResult<Vec<Comment>> {
        let mut conn = self.pool.acquire().await?;
        select_by_posts(&mut conn, &[post_id]).await
    }

    /// Live comments of any of `post_ids` in one query
    pub async fn find_by_posts(&self, post_ids: &[Id]) -> RepositoryResult<Vec<Comment>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.acquire().await?;
        select_by_posts(&mut conn, post_ids).await
    }

    /// Soft-delete a single live comment
    pub async fn delete(&self, id: Id) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE comments SET {} WHERE id = $1 AND {} RETURNING post_id",
            MARK_DELETED,
            live("comments")
        );
        let post_id = sqlx::query_scalar::<_, Id>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found::<Comment>(id))?;

        hooks::on_comment_deleted(&mut tx, post_id).await?;
        tx.commit().await?;

        tracing::debug!(comment_id = id, post_id, "Deleted comment");
        Ok(())
    }

    /// Soft-delete every live comment of a post.
    ///
    /// Returns how many comments were deleted. A non-positive id deletes
    /// nothing and never reaches the store.
    pub async fn delete_by_post(&self, post_id: Id) -> RepositoryResult<u64> {
        if post_id <= 0 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE comments SET {} WHERE post_id = $1 AND {} RETURNING post_id",
            MARK_DELETED,
            live("comments")
        );
        let deleted_rows = sqlx::query_scalar::<_, Id>(&sql)
            .bind(post_id)
            .fetch_all(&mut *tx)
            .await?;

        // one hook call per deleted comment
        for owner in &deleted_rows {
            hooks::on_comment_deleted(&mut tx, *owner).await?;
        }

        tx.commit().await?;

        let deleted = deleted_rows.len() as u64;
        tracing::info!(post_id, deleted, "Deleted comments by post");
        Ok(deleted)
    }

    /// Undo the soft delete of a post's comments
    pub async fn restore_by_post(&self, post_id: Id) -> RepositoryResult<u64> {
        if post_id <= 0 {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE comments SET {} WHERE post_id = $1 AND {}",
            MARK_RESTORED,
            deleted("comments")
        );
        let restored = sqlx::query(&sql)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if restored > 0 {
            hooks::recompute_comment_status(&mut tx, post_id).await?;
        }

        tx.commit().await?;

        tracing::info!(post_id, restored, "Restored comments by post");
        Ok(restored)
    }

    /// Permanently remove a post's soft-deleted comments.
    ///
    /// Live comments are untouched, so the post's status cannot change.
    pub async fn purge_deleted(&self, post_id: Id) -> RepositoryResult<u64> {
        if post_id <= 0 {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM comments WHERE post_id = $1 AND {}",
            deleted("comments")
        );
        let purged = sqlx::query(&sql)
            .bind(post_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(post_id, purged, "Purged deleted comments");
        Ok(purged)
    }
}

/// Live comments of the given posts on an open connection, by id
pub(crate) async fn select_by_posts(conn: &mut PgConnection, post_ids: &[Id]) -> RepositoryResult<Vec<Comment>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {} FROM comments WHERE post_id = ANY($1) AND {} ORDER BY id ASC",
        COMMENT_COLUMNS,
        live("comments")
    );
    let rows = sqlx::query_as::<_, Comment>(&sql)
        .bind(post_ids)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Insert a comment and recompute its post's status on the same connection
pub(crate) async fn insert(conn: &mut PgConnection, dto: &NewComment) -> RepositoryResult<Comment> {
    dto.check()?;

    let sql = format!(
        r#"
        INSERT INTO comments (content, post_id, user_id, created_at, updated_at)
        VALUES ($1, $2, $3, NOW(), NOW())
        RETURNING {}
        "#,
        COMMENT_COLUMNS
    );
    let comment = sqlx::query_as::<_, Comment>(&sql)
        .bind(&dto.content)
        .bind(dto.post_id)
        .bind(dto.user_id)
        .fetch_one(&mut *conn)
        .await?;

    hooks::on_comment_created(conn, &comment).await?;

    tracing::debug!(comment_id = comment.id, post_id = comment.post_id, "Created comment");
    Ok(comment)
}

#[async_trait]
impl Repository<Comment, NewComment> for CommentRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE id = $1 AND {}",
            COMMENT_COLUMNS,
            live("comments")
        );
        let row = sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE {} ORDER BY id ASC LIMIT $1 OFFSET $2",
            COMMENT_COLUMNS,
            live("comments")
        );
        let rows = sqlx::query_as::<_, Comment>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM comments WHERE {}", live("comments"));
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: NewComment) -> RepositoryResult<Comment> {
        let mut tx = self.pool.begin().await?;
        let comment = insert(&mut tx, &dto).await?;
        tx.commit().await?;

        Ok(comment)
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1 AND {})",
            live("comments")
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
