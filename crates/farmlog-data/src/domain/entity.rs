//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.
//! All entities are flat records keyed by a sequential integer id.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone + Serialize + DeserializeOwned + 'static {
    /// Collection name at the record store; also the local storage key suffix
    const TABLE: &'static str;

    /// Human readable noun used in log lines and notifications
    const KIND: &'static str;

    /// Fields requested when fetching the collection
    const FIELDS: &'static [&'static str];

    /// Returns the entity's unique identifier
    fn id(&self) -> u32;

    /// Replace the identifier (assigned by the store on create)
    fn set_id(&mut self, id: u32);

    /// Foreign key to the owning farm, if the entity has one
    fn farm_id(&self) -> Option<u32> {
        None
    }

    /// Defaults stamped onto a record when the local store creates it
    fn on_create(&mut self, _now: DateTime<Utc>) {}

    /// Carry store-managed fields over from the stored version on full replace
    fn keep_store_fields(&mut self, _previous: &Self) {}
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// A field-level error reported by the record store for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel")]
    pub field_label: String,
    pub message: String,
}

/// One rejected record out of a create/update/delete batch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordFailure {
    pub message: Option<String>,
    pub errors: Vec<FieldError>,
}

impl RecordFailure {
    /// One line per field error, or the record message when there are none
    pub fn lines(&self) -> Vec<String> {
        if self.errors.is_empty() {
            return vec![self.message.clone().unwrap_or_else(|| "Record rejected".to_string())];
        }
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field_label, e.message))
            .collect()
    }
}

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DomainError {
    NotFound(String),
    InvalidInput(String),
    Conflict(String),
    /// No record-store client is configured
    Unavailable(String),
    /// The store answered a read with `success: false`
    Fetch(String),
    /// The store rejected a create/update/delete
    Persistence {
        message: String,
        failures: Vec<RecordFailure>,
    },
    Internal(String),
}

impl DomainError {
    pub fn persistence(message: impl Into<String>) -> Self {
        DomainError::Persistence {
            message: message.into(),
            failures: Vec::new(),
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DomainError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            DomainError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            DomainError::Unavailable(msg) => write!(f, "Record store unavailable: {}", msg),
            DomainError::Fetch(msg) => write!(f, "Fetch failed: {}", msg),
            DomainError::Persistence { message, failures } => {
                write!(f, "Persistence error: {}", message)?;
                if !failures.is_empty() {
                    write!(f, " ({} record(s) rejected)", failures.len())?;
                }
                Ok(())
            }
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_failure_lines() {
        let failure = RecordFailure {
            message: Some("bad".to_string()),
            errors: vec![FieldError {
                field_label: "amount".to_string(),
                message: "must be positive".to_string(),
            }],
        };
        assert_eq!(failure.lines(), vec!["amount: must be positive".to_string()]);

        let bare = RecordFailure {
            message: Some("duplicate".to_string()),
            errors: vec![],
        };
        assert_eq!(bare.lines(), vec!["duplicate".to_string()]);
    }

    #[test]
    fn test_persistence_display_counts_failures() {
        let err = DomainError::Persistence {
            message: "create rejected".to_string(),
            failures: vec![RecordFailure::default(), RecordFailure::default()],
        };
        assert_eq!(err.to_string(), "Persistence error: create rejected (2 record(s) rejected)");
    }
}
