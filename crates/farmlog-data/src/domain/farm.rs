//! Farm Entity
//!
//! Top-level record; crops, tasks and expenses point at a farm by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Unit the farm size is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AreaUnit {
    #[default]
    #[serde(rename = "acres")]
    Acres,
    #[serde(rename = "hectares")]
    Hectares,
    #[serde(rename = "sq ft")]
    SqFt,
    #[serde(rename = "sq m")]
    SqM,
}

impl AreaUnit {
    pub const ALL: [AreaUnit; 4] = [AreaUnit::Acres, AreaUnit::Hectares, AreaUnit::SqFt, AreaUnit::SqM];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaUnit::Acres => "acres",
            AreaUnit::Hectares => "hectares",
            AreaUnit::SqFt => "sq ft",
            AreaUnit::SqM => "sq m",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str() == s)
    }
}

/// A farm with its location and size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    /// Unique identifier (0 until the store assigns one)
    #[serde(rename = "Id", default)]
    pub id: u32,
    pub name: String,
    pub location: String,
    /// Always positive
    pub size: f64,
    #[serde(default)]
    pub unit: AreaUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Farm {
    /// Create a new farm with default values
    pub fn new(id: u32, name: impl Into<String>, location: impl Into<String>, size: f64, unit: AreaUnit) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
            size,
            unit,
            created_at: None,
        }
    }
}

impl Entity for Farm {
    const TABLE: &'static str = "farms";
    const KIND: &'static str = "Farm";
    const FIELDS: &'static [&'static str] = &["Id", "name", "location", "size", "unit", "createdAt"];

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn on_create(&mut self, now: DateTime<Utc>) {
        self.created_at = Some(now);
    }

    fn keep_store_fields(&mut self, previous: &Self) {
        if self.created_at.is_none() {
            self.created_at = previous.created_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_wire_names() {
        let farm = Farm::new(1, "North Field", "Fresno, CA", 12.5, AreaUnit::SqFt);
        let json = serde_json::to_value(&farm).unwrap();
        assert_eq!(json["unit"], "sq ft");
        assert_eq!(json["Id"], 1);
        assert!(json.get("createdAt").is_none());
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!(AreaUnit::from_str("hectares"), Some(AreaUnit::Hectares));
        assert_eq!(AreaUnit::from_str("furlongs"), None);
    }
}
