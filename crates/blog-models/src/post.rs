//! Post model
//!
//! Table: posts

use std::fmt;
use std::str::FromStr;

use blog_core::error::ValidationErrors;
use blog_core::traits::{Entity, Id, Identifiable, SoftDeletable, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Cached flag telling whether a post has any live comments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    HasComments,
    #[default]
    NoComments,
}

impl CommentStatus {
    /// The only rule mapping a live comment count to a status
    pub fn from_live_count(count: i64) -> Self {
        if count > 0 {
            CommentStatus::HasComments
        } else {
            CommentStatus::NoComments
        }
    }

    /// Stored text form
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::HasComments => "has_comments",
            CommentStatus::NoComments => "no_comments",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `comment_status` value the store should never contain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown comment status '{0}'")]
pub struct UnknownCommentStatus(pub String);

impl FromStr for CommentStatus {
    type Err = UnknownCommentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "has_comments" => Ok(CommentStatus::HasComments),
            "no_comments" => Ok(CommentStatus::NoComments),
            other => Err(UnknownCommentStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for CommentStatus {
    type Error = UnknownCommentStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Post entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub content: String,

    /// Owning user
    pub user_id: Id,

    #[sqlx(try_from = "String")]
    pub comment_status: CommentStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn has_comments(&self) -> bool {
        self.comment_status == CommentStatus::HasComments
    }
}

impl Identifiable for Post {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for Post {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl SoftDeletable for Post {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Entity for Post {
    const TABLE_NAME: &'static str = "posts";
    const TYPE_NAME: &'static str = "Post";
}

/// New post creation parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPost {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "can't be blank"))]
    pub content: String,

    #[validate(range(min = 1, message = "must reference an existing user"))]
    pub user_id: i64,
}

impl NewPost {
    pub fn new(user_id: Id, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
        }
    }

    /// Validate, collecting every failing field
    pub fn check(&self) -> Result<(), ValidationErrors> {
        self.validate().map_err(ValidationErrors::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_live_count() {
        assert_eq!(CommentStatus::from_live_count(0), CommentStatus::NoComments);
        assert_eq!(CommentStatus::from_live_count(1), CommentStatus::HasComments);
        assert_eq!(CommentStatus::from_live_count(42), CommentStatus::HasComments);
        // a negative count cannot come from COUNT(*), but must not read as "has comments"
        assert_eq!(CommentStatus::from_live_count(-1), CommentStatus::NoComments);
    }

    #[test]
    fn test_status_text_form() {
        for status in [CommentStatus::HasComments, CommentStatus::NoComments] {
            assert_eq!(status.as_str().parse::<CommentStatus>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(
            "maybe".parse::<CommentStatus>(),
            Err(UnknownCommentStatus("maybe".to_string()))
        );
        assert_eq!(CommentStatus::default(), CommentStatus::NoComments);
    }

    #[test]
    fn test_status_serializes_as_stored_text() {
        let json = serde_json::to_string(&CommentStatus::HasComments).unwrap();
        assert_eq!(json, "\"has_comments\"");
    }

    #[test]
    fn test_new_post_validation() {
        assert!(NewPost::new(1, "Title", "Body").check().is_ok());

        let errors = NewPost::new(0, "", "").check().unwrap_err();
        assert!(errors.has_error("user_id"));
        assert!(errors.has_error("title"));
        assert!(errors.has_error("content"));

        let errors = NewPost::new(1, "t".repeat(201), "Body").check().unwrap_err();
        assert!(errors.has_error("title"));
    }

    #[test]
    fn test_new_post_owner_must_be_positive() {
        let errors = NewPost::new(-1, "Title", "Body").check().unwrap_err();
        assert_eq!(
            errors.get("user_id").map(|m| m[0].as_str()),
            Some("must reference an existing user")
        );
        assert!(!errors.has_error("title"));
    }
}
