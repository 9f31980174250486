//! Core traits shared by the stored records

use chrono::{DateTime, Utc};

/// Primary key type (`BIGSERIAL` in the store)
pub type Id = i64;

/// Records addressed by a numeric primary key
pub trait Identifiable {
    fn id(&self) -> Id;
}

/// Records carrying `created_at` / `updated_at`
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Records hidden by setting `deleted_at` instead of being removed
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Base trait for all stored records
pub trait Entity: Identifiable + Timestamped + SoftDeletable + Send + Sync {
    /// Table the record is stored in
    const TABLE_NAME: &'static str;

    /// Name used in not-found messages
    const TYPE_NAME: &'static str;
}
