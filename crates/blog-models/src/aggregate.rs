//! Read-side aggregates built from several tables

use std::collections::HashMap;

use blog_core::traits::Id;
use serde::Serialize;

use crate::comment::Comment;
use crate::post::Post;
use crate::user::User;

/// A post together with its live comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// A user with every live post and, nested in each, that post's comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserWithPosts {
    #[serde(flatten)]
    pub user: User,
    pub posts: Vec<PostWithComments>,
}

impl UserWithPosts {
    /// Stitch bulk-fetched rows together by foreign key.
    ///
    /// Post order is kept as given; comments keep their relative order
    /// within each post. Comments whose `post_id` matches none of `posts`
    /// are dropped.
    pub fn assemble(user: User, posts: Vec<Post>, comments: Vec<Comment>) -> Self {
        let mut by_post: HashMap<Id, Vec<Comment>> = HashMap::with_capacity(posts.len());
        for comment in comments {
            by_post.entry(comment.post_id).or_default().push(comment);
        }

        let posts = posts
            .into_iter()
            .map(|post| {
                let comments = by_post.remove(&post.id).unwrap_or_default();
                PostWithComments { post, comments }
            })
            .collect();

        Self { user, posts }
    }

    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|p| p.comments.len()).sum()
    }
}

/// A post and its live comment count, as produced by the ranking query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PostCommentCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::CommentStatus;
    use chrono::Utc;

    fn user(id: Id) -> User {
        User {
            id,
            username: format!("user{}", id),
            email: None,
            password_hash: "hash".to_string(),
            post_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn post(id: Id, user_id: Id) -> Post {
        Post {
            id,
            title: format!("post {}", id),
            content: "body".to_string(),
            user_id,
            comment_status: CommentStatus::NoComments,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn comment(id: Id, post_id: Id) -> Comment {
        Comment {
            id,
            content: format!("comment {}", id),
            post_id,
            user_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_assemble_partitions_comments_by_post() {
        // interleaved the way a single `post_id = ANY(..) ORDER BY id` fetch can return them
        let comments = vec![
            comment(1, 10),
            comment(2, 11),
            comment(3, 10),
            comment(4, 11),
            comment(5, 10),
        ];
        let result = UserWithPosts::assemble(user(1), vec![post(10, 1), post(11, 1)], comments);

        assert_eq!(result.posts.len(), 2);
        let first: Vec<Id> = result.posts[0].comments.iter().map(|c| c.id).collect();
        let second: Vec<Id> = result.posts[1].comments.iter().map(|c| c.id).collect();
        assert_eq!(first, vec![1, 3, 5]);
        assert_eq!(second, vec![2, 4]);
        assert!(result.posts[0].comments.iter().all(|c| c.post_id == 10));
        assert!(result.posts[1].comments.iter().all(|c| c.post_id == 11));
        assert_eq!(result.comment_count(), 5);
    }

    #[test]
    fn test_assemble_keeps_posts_without_comments() {
        let result =
            UserWithPosts::assemble(user(1), vec![post(10, 1), post(11, 1)], vec![comment(1, 11)]);
        assert!(result.posts[0].comments.is_empty());
        assert_eq!(result.posts[1].comments.len(), 1);
    }

    #[test]
    fn test_assemble_drops_orphans() {
        let result = UserWithPosts::assemble(user(1), vec![post(10, 1)], vec![comment(1, 99)]);
        assert_eq!(result.comment_count(), 0);
    }

    #[test]
    fn test_serialized_shape_is_nested() {
        let result = UserWithPosts::assemble(user(7), vec![post(10, 7)], vec![comment(1, 10)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["posts"][0]["id"], 10);
        assert_eq!(json["posts"][0]["comment_status"], "no_comments");
        assert_eq!(json["posts"][0]["comments"][0]["post_id"], 10);
    }
}
