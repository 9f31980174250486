//! User model
//!
//! Table: users

use blog_core::error::ValidationErrors;
use blog_core::traits::{Entity, Id, Identifiable, SoftDeletable, Timestamped};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User entity
///
/// `post_count` is denormalized: it is only ever changed by the store-side
/// increment that runs with each post insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Id,

    /// Login name (unique)
    pub username: String,

    /// Email address (unique when present)
    pub email: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Number of posts owned by the user
    pub post_count: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Identifiable for User {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for User {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl SoftDeletable for User {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Entity for User {
    const TABLE_NAME: &'static str = "users";
    const TYPE_NAME: &'static str = "User";
}

/// New user creation parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub username: String,

    #[validate(
        email(message = "is not a valid email address"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub password_hash: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            password_hash: password_hash.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
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
    fn test_valid_new_user() {
        let user = NewUser::new("root", "$argon2id$v=19$...").with_email("root@example.com");
        assert!(user.check().is_ok());
    }

    #[test]
    fn test_email_is_optional() {
        assert!(NewUser::new("root", "hash").check().is_ok());
    }

    #[test]
    fn test_rejects_blank_and_oversized_fields() {
        let user = NewUser::new("", "hash");
        assert!(user.check().unwrap_err().has_error("username"));

        let user = NewUser::new("x".repeat(51), "hash");
        assert!(user.check().unwrap_err().has_error("username"));

        let user = NewUser::new("root", "");
        assert!(user.check().unwrap_err().has_error("password_hash"));
    }

    #[test]
    fn test_rejects_malformed_email() {
        let errors = NewUser::new("root", "hash")
            .with_email("not-an-address")
            .check()
            .unwrap_err();
        assert!(errors.has_error("email"));
        assert!(!errors.has_error("username"));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: 1,
            username: "root".to_string(),
            email: None,
            password_hash: "secret".to_string(),
            post_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "root");
        assert!(!user.is_deleted());
    }
}
