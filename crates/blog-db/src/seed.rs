//! Demo data
//!
//! One user with two posts, three comments on the first and two on the
//! second. Inserted through the same hooks as every other write.

use blog_core::traits::Id;
use blog_models::{NewComment, NewPost, NewUser};
use serde::Serialize;
use sqlx::PgPool;

use crate::repository::RepositoryResult;
use crate::{comments, posts, users};

/// Comments seeded per post, in post order
const COMMENTS_PER_POST: [usize; 2] = [3, 2];

/// Ids of the seeded rows
#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub user_id: Id,
    pub post_ids: Vec<Id>,
    pub comment_count: usize,
}

/// The demo user; the email is left out when the username cannot form one
fn demo_user(username: &str) -> NewUser {
    let user = NewUser::new(username, "demo-password-hash");
    let email = format!("{}@example.com", username);
    if validator::validate_email(&email) {
        user.with_email(email)
    } else {
        user
    }
}

/// Insert the demo data in one transaction
pub async fn seed_demo(pool: &PgPool, username: &str) -> RepositoryResult<SeedReport> {
    let mut tx = pool.begin().await?;

    let user = users::insert(&mut tx, &demo_user(username)).await?;

    let mut post_ids = Vec::with_capacity(COMMENTS_PER_POST.len());
    let mut comment_count = 0;

    for (index, &count) in COMMENTS_PER_POST.iter().enumerate() {
        let post = posts::insert(
            &mut tx,
            &NewPost::new(
                user.id,
                format!("Post {}", index + 1),
                format!("Body of post {} by {}.", index + 1, user.username),
            ),
        )
        .await?;

        for n in 0..count {
            comments::insert(
                &mut tx,
                &NewComment::new(post.id, user.id, format!("Comment {} on post {}", n + 1, index + 1)),
            )
            .await?;
            comment_count += 1;
        }

        post_ids.push(post.id);
    }

    tx.commit().await?;

    tracing::info!(
        user_id = user.id,
        posts = post_ids.len(),
        comments = comment_count,
        "Seeded demo data"
    );

    Ok(SeedReport {
        user_id: user.id,
        post_ids,
        comment_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_user_email() {
        let user = demo_user("demo");
        assert_eq!(user.email.as_deref(), Some("demo@example.com"));
        assert!(user.check().is_ok());
    }

    #[test]
    fn test_demo_user_without_usable_email() {
        for username in ["demo author", "demo@home"] {
            let user = demo_user(username);
            assert_eq!(user.email, None);
            assert!(user.check().is_ok(), "{}", username);
        }
    }
}
