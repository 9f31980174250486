//! Comment model
//!
//! Table: comments

use blog_core::error::ValidationErrors;
use blog_core::traits::{Entity, Id, Identifiable, SoftDeletable, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Comment entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Id,
    pub content: String,

    /// Post the comment belongs to
    pub post_id: Id,

    /// Author
    pub user_id: Id,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Identifiable for Comment {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for Comment {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl SoftDeletable for Comment {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Entity for Comment {
    const TABLE_NAME: &'static str = "comments";
    const TYPE_NAME: &'static str = "Comment";
}

/// New comment creation parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewComment {
    #[validate(length(min = 1, message = "can't be blank"))]
    pub content: String,

    // `range` only accepts primitive number types, not the `Id` alias
    #[validate(range(min = 1, message = "must reference an existing post"))]
    pub post_id: i64,

    #[validate(range(min = 1, message = "must reference an existing user"))]
    pub user_id: i64,
}

impl NewComment {
    pub fn new(post_id: Id, user_id: Id, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            post_id,
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
    fn test_new_comment_validation() {
        assert!(NewComment::new(1, 1, "Nice post").check().is_ok());

        let errors = NewComment::new(0, -3, "").check().unwrap_err();
        assert!(errors.has_error("post_id"));
        assert!(errors.has_error("user_id"));
        assert!(errors.has_error("content"));
        assert_eq!(
            errors.get("post_id").map(|m| m[0].as_str()),
            Some("must reference an existing post")
        );
    }

    #[test]
    fn test_new_comment_ids_must_be_positive() {
        let errors = NewComment::new(i64::MIN, 0, "text").check().unwrap_err();
        assert!(errors.has_error("post_id"));
        assert!(errors.has_error("user_id"));
        assert!(!errors.has_error("content"));

        assert!(NewComment::new(i64::MAX, 1, "text").check().is_ok());
    }
}
