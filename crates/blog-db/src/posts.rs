//! Post repository
//!
//! Database operations for posts, including the most-commented query.

use async_trait::async_trait;
use blog_core::traits::Id;
use blog_models::{NewPost, Post, PostCommentCount};
use sqlx::{PgConnection, PgPool};

use crate::hooks;
use crate::repository::{Pagination, Repository, RepositoryError, RepositoryResult};
use crate::scope::live;

pub(crate) const POST_COLUMNS: &str =
    "id, title, content, user_id, comment_status, created_at, updated_at, deleted_at";

/// Post columns qualified with a table alias
fn qualified(alias: &str) -> String {
    POST_COLUMNS
        .split(", ")
        .map(|column| format!("{}.{}", alias, column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Live comment counts per post, joined onto live posts.
/// Posts without comments get a count of zero.
fn with_comment_counts() -> String {
    format!(
        r#"
        SELECT {}, COALESCE(c.comment_count, 0) AS comment_count
        FROM posts p
        LEFT JOIN (
            SELECT post_id, COUNT(*) AS comment_count
            FROM comments
            WHERE {}
            GROUP BY post_id
        ) c ON c.post_id = p.id
        WHERE {}
        "#,
        qualified("p"),
        live("comments"),
        live("p")
    )
}

/// Post repository implementation
#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Live posts of a user, oldest first
    pub async fn find_by_user(&self, user_id: Id) -> RepositoryResult<Vec<Post>> {
        let mut conn = self.pool.acquire().await?;
        select_by_user(&mut conn, user_id).await
    }

    /// Number of live comments on a post
    pub async fn live_comment_count(&self, post_id: Id) -> RepositoryResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Ok(hooks::count_live_comments(&mut conn, post_id).await?)
    }

    /// The live post with the most live comments.
    ///
    /// Ties go to the lowest post id. A post without comments still
    /// qualifies with a count of zero.
    pub async fn most_commented(&self) -> RepositoryResult<PostCommentCount> {
        let sql = format!(
            "{} ORDER BY comment_count DESC, p.id ASC LIMIT 1",
            with_comment_counts()
        );
        let row = sqlx::query_as::<_, PostCommentCount>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| RepositoryError::NotFound("No posts found".to_string()))
    }

    /// Every live post tied at the highest live comment count, by id.
    ///
    /// Empty when no post has a live comment.
    pub async fn most_commented_all(&self) -> RepositoryResult<Vec<PostCommentCount>> {
        let sql = format!(
            r#"
            WITH counted AS ({})
            SELECT * FROM counted
            WHERE comment_count > 0
              AND comment_count = (SELECT MAX(comment_count) FROM counted)
            ORDER BY id ASC
            "#,
            with_comment_counts()
        );
        let rows = sqlx::query_as::<_, PostCommentCount>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

/// Live posts of a user on an open connection
pub(crate) async fn select_by_user(conn: &mut PgConnection, user_id: Id) -> RepositoryResult<Vec<Post>> {
    let sql = format!(
        "SELECT {} FROM posts WHERE user_id = $1 AND {} ORDER BY id ASC",
        POST_COLUMNS,
        live("posts")
    );
    let rows = sqlx::query_as::<_, Post>(&sql)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows)
}

/// Insert a post and bump its owner's counter on the same connection.
///
/// The connection should be inside a transaction so a failed hook undoes
/// the insert.
pub(crate) async fn insert(conn: &mut PgConnection, dto: &NewPost) -> RepositoryResult<Post> {
    dto.check()?;

    let sql = format!(
        r#"
        INSERT INTO posts (title, content, user_id, comment_status, created_at, updated_at)
        VALUES ($1, $2, $3, 'no_comments', NOW(), NOW())
        RETURNING {}
        "#,
        POST_COLUMNS
    );
    let post = sqlx::query_as::<_, Post>(&sql)
        .bind(&dto.title)
        .bind(&dto.content)
        .bind(dto.user_id)
        .fetch_one(&mut *conn)
        .await?;

    hooks::on_post_created(conn, &post).await?;

    tracing::debug!(post_id = post.id, user_id = post.user_id, "Created post");
    Ok(post)
}

#[async_trait]
impl Repository<Post, NewPost> for PostRepository {
    async fn find_by_id(&self, id: Id) -> RepositoryResult<Option<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE id = $1 AND {}",
            POST_COLUMNS,
            live("posts")
        );
        let row = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_all(&self, pagination: Pagination) -> RepositoryResult<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts WHERE {} ORDER BY id ASC LIMIT $1 OFFSET $2",
            POST_COLUMNS,
            live("posts")
        );
        let rows = sqlx::query_as::<_, Post>(&sql)
            .bind(pagination.limit)
            .bind(pagination.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn count(&self) -> RepositoryResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM posts WHERE {}", live("posts"));
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, dto: NewPost) -> RepositoryResult<Post> {
        let mut tx = self.pool.begin().await?;
        let post = insert(&mut tx, &dto).await?;
        tx.commit().await?;

        Ok(post)
    }

    async fn exists(&self, id: Id) -> RepositoryResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1 AND {})",
            live("posts")
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }
}
