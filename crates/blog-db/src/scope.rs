//! Soft-delete scoping shared by every query
//!
//! Rows are never removed by normal deletes; they get a `deleted_at`
//! timestamp instead. Every read and every count must go through [`live`].

/// Predicate keeping only rows of `table` (or alias) that are not soft-deleted
pub fn live(table: &str) -> String {
    format!("{}.deleted_at IS NULL", table)
}

/// Predicate matching only soft-deleted rows of `table`
pub fn deleted(table: &str) -> String {
    format!("{}.deleted_at IS NOT NULL", table)
}

/// `SET` list marking rows deleted
pub const MARK_DELETED: &str = "deleted_at = NOW(), updated_at = NOW()";

/// `SET` list undoing a soft delete
pub const MARK_RESTORED: &str = "deleted_at = NULL, updated_at = NOW()";
