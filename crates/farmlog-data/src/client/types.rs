//! Record Store Wire Types
//!
//! Request and response envelopes exchanged with the record store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{FieldError, RecordFailure};

// ========================
// Queries
// ========================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
}

/// One `where` condition. Conditions in a query are conjoined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhereClause {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
    /// `false` negates the condition
    #[serde(default = "default_true")]
    pub include: bool,
}

fn default_true() -> bool {
    true
}

impl WhereClause {
    /// Evaluate against a raw record. Numbers compare numerically, everything
    /// else by its JSON string form (ISO dates sort correctly this way).
    pub fn matches(&self, record: &Value) -> bool {
        let Some(actual) = record.get(&self.field_name) else {
            return !self.include;
        };
        let hit = self.values.iter().any(|expected| match self.operator {
            Operator::EqualTo => compare(actual, expected) == Some(std::cmp::Ordering::Equal),
            Operator::GreaterThanOrEqualTo => matches!(
                compare(actual, expected),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            Operator::LessThanOrEqualTo => matches!(
                compare(actual, expected),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            ),
        });
        hit == self.include
    }
}

fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchParams {
    pub fields: Vec<String>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
}

impl FetchParams {
    pub fn with_fields(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            where_clauses: Vec::new(),
        }
    }

    /// Add a condition; chained calls are conjoined
    pub fn filter(mut self, field_name: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.where_clauses.push(WhereClause {
            field_name: field_name.to_string(),
            operator,
            values: vec![value.into()],
            include: true,
        });
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.where_clauses.iter().all(|c| c.matches(record))
    }
}

// ========================
// Envelopes
// ========================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsRequest {
    pub records: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<u32>,
}

/// Per-record outcome inside a mutation response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordResult {
    pub fn failure(&self) -> RecordFailure {
        RecordFailure {
            message: self.message.clone(),
            errors: self.errors.clone(),
        }
    }
}

/// Response to create, update and delete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<RecordResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
