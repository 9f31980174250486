//! Shared setup for database tests.
//!
//! Run with `DATABASE_URL` set:
//! cargo test -p blog-db -- --ignored
//!
//! Every test gets its own freshly migrated schema, dropped again by
//! [`TestDb::teardown`].

#![allow(dead_code)]

use blog_db::{auto_migrate, Database, DatabaseConfig, LoggingConfig, Repository};
use blog_models::{Comment, NewComment, NewPost, NewUser, Post, User};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::internet::en::Username;
use fake::Fake;

pub struct TestDb {
    pub db: Database,
    pub schema: String,
}

impl TestDb {
    pub async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let schema = format!("blog_test_{}", uuid::Uuid::new_v4().simple());
        let config = DatabaseConfig::with_url(url).with_schema(schema.clone());

        let db = Database::connect(&config, &LoggingConfig::default())
            .await
            .expect("connect");
        auto_migrate(db.pool(), Some(&schema)).await.expect("migrate");

        Self { db, schema }
    }

    pub async fn teardown(self) {
        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema))
            .execute(self.db.pool())
            .await
            .expect("drop schema");
        self.db.close().await;
    }

    pub async fn user(&self) -> User {
        let username = format!(
            "{}_{}",
            Username().fake::<String>(),
            &uuid::Uuid::new_v4().simple().to_string()[..8]
        );
        self.db
            .users()
            .create(NewUser::new(username, "test-password-hash"))
            .await
            .expect("create user")
    }

    pub async fn post(&self, user_id: i64) -> Post {
        let title: String = Sentence(2..6).fake();
        let content: String = Paragraph(1..3).fake();
        self.db
            .posts()
            .create(NewPost::new(user_id, title, content))
            .await
            .expect("create post")
    }

    pub async fn comment(&self, post_id: i64, user_id: i64) -> Comment {
        let content: String = Sentence(3..10).fake();
        self.db
            .comments()
            .create(NewComment::new(post_id, user_id, content))
            .await
            .expect("create comment")
    }

    /// Reload a post, including soft-deleted ones
    pub async fn raw_post(&self, id: i64) -> Option<Post> {
        sqlx::query_as::<_, Post>(
            "SELECT id, title, content, user_id, comment_status, created_at, updated_at, deleted_at \
             FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
        .expect("load post")
    }

    /// Number of comment rows of a post, soft-deleted ones included
    pub async fn raw_comment_rows(&self, post_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await
            .expect("count comments")
    }
}
