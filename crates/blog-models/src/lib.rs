//! # blog-models
//!
//! Domain models for the blog store.
//!
//! Each record maps to one table and implements the core traits from
//! `blog-core` (Entity, Identifiable, Timestamped, SoftDeletable).

pub use blog_core::traits::{Entity, Id, Identifiable, SoftDeletable, Timestamped};

pub mod aggregate;
pub mod comment;
pub mod post;
pub mod user;

pub use aggregate::{PostCommentCount, PostWithComments, UserWithPosts};
pub use comment::{Comment, NewComment};
pub use post::{CommentStatus, NewPost, Post, UnknownCommentStatus};
pub use user::{NewUser, User};
