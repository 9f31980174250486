//! Lifecycle hooks for denormalized fields
//!
//! Each hook runs on the caller's transaction connection. A failing hook
//! returns [`RepositoryError::AggregateUpdate`]; callers propagate it with
//! `?`, which drops the transaction uncommitted and rolls back the write
//! that triggered the hook.

use blog_core::traits::Id;
use blog_models::{Comment, CommentStatus, Post};
use sqlx::PgConnection;
use tracing::debug;

use crate::repository::{RepositoryError, RepositoryResult};
use crate::scope::live;

/// Aggregate name used in errors for the user post counter
pub const POST_COUNT: &str = "users.post_count";

/// Aggregate name used in errors for the post comment status
pub const COMMENT_STATUS: &str = "posts.comment_status";

fn failed(aggregate: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |source| RepositoryError::AggregateUpdate { aggregate, source }
}

/// Increment the owner's `post_count` in the store itself.
///
/// Concurrent inserts for the same user serialize on the row lock taken by
/// the `UPDATE`, so no increment is lost. An owner that is missing or
/// soft-deleted fails the hook.
pub async fn on_post_created(conn: &mut PgConnection, post: &Post) -> RepositoryResult<()> {
    let sql = format!(
        "UPDATE users SET post_count = post_count + 1 WHERE id = $1 AND {}",
        live("users")
    );
    let result = sqlx::query(&sql)
        .bind(post.user_id)
        .execute(&mut *conn)
        .await
        .map_err(failed(POST_COUNT))?;

    if result.rows_affected() == 0 {
        return Err(failed(POST_COUNT)(sqlx::Error::RowNotFound));
    }

    debug!(post_id = post.id, user_id = post.user_id, "Incremented post count");
    Ok(())
}

/// Recompute the owning post's status after a comment insert
pub async fn on_comment_created(
    conn: &mut PgConnection,
    comment: &Comment,
) -> RepositoryResult<CommentStatus> {
    recompute_comment_status(conn, comment.post_id).await
}

/// Recompute a post's status after one of its comments was deleted.
///
/// Must run after the delete so the removed row no longer counts.
pub async fn on_comment_deleted(conn: &mut PgConnection, post_id: Id) -> RepositoryResult<CommentStatus> {
    recompute_comment_status(conn, post_id).await
}

/// Count the live comments of a post
pub async fn count_live_comments(conn: &mut PgConnection, post_id: Id) -> Result<i64, sqlx::Error> {
    let sql = format!(
        "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND {}",
        live("comments")
    );
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(post_id)
        .fetch_one(&mut *conn)
        .await
}

/// Set `comment_status` from the current live comment count.
///
/// The post row is locked first (`FOR NO KEY UPDATE`, which does not block
/// comment inserts holding their foreign-key share lock) so concurrent
/// recomputations for one post run one after the other and the last one
/// counts every committed change. Running it twice in a row stores the
/// same value both times.
pub async fn recompute_comment_status(
    conn: &mut PgConnection,
    post_id: Id,
) -> RepositoryResult<CommentStatus> {
    let locked = sqlx::query_scalar::<_, Id>("SELECT id FROM posts WHERE id = $1 FOR NO KEY UPDATE")
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(failed(COMMENT_STATUS))?;
    if locked.is_none() {
        return Err(failed(COMMENT_STATUS)(sqlx::Error::RowNotFound));
    }

    let count = count_live_comments(conn, post_id)
        .await
        .map_err(failed(COMMENT_STATUS))?;
    let status = CommentStatus::from_live_count(count);

    sqlx::query("UPDATE posts SET comment_status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(post_id)
        .execute(&mut *conn)
        .await
        .map_err(failed(COMMENT_STATUS))?;

    debug!(post_id, count, status = %status, "Recomputed comment status");
    Ok(status)
}
