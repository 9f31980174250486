//! # blog-core
//!
//! Core types, traits, and configuration for the blog store.
//!
//! This crate provides the building blocks shared by the other crates:
//! - Validation error collection
//! - Core traits (Entity, Identifiable, Timestamped, SoftDeletable)
//! - Application configuration (database, logging)

pub mod config;
pub mod error;
pub mod traits;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LoggingConfig};
pub use error::*;
pub use traits::*;
