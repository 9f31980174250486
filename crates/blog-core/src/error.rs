//! Validation error collection
//!
//! Write models are checked before any statement reaches the store; the
//! failures are gathered per field.

use std::collections::BTreeMap;
use thiserror::Error;

/// Field-keyed validation failures
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("Validation failed: {}", summarize(.errors, .base_errors))]
pub struct ValidationErrors {
    /// Messages per field name
    pub errors: BTreeMap<String, Vec<String>>,
    /// Errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }
}

fn summarize(errors: &BTreeMap<String, Vec<String>>, base_errors: &[String]) -> String {
    let mut parts = base_errors.to_vec();
    for (field, messages) in errors {
        parts.extend(messages.iter().map(|msg| format!("{} {}", field, msg)));
    }
    parts.join(", ")
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = ValidationErrors::new();
        for (field, field_errors) in source.field_errors() {
            for error in field_errors {
                let message = match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("is invalid ({})", error.code),
                };
                errors.add(field.to_string(), message);
            }
        }
        errors
    }
}
