//! Crop Entity
//!
//! A planting on one field of a farm.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Growth stage of a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CropStatus {
    #[default]
    Planted,
    Growing,
    Harvested,
}

impl CropStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropStatus::Planted => "planted",
            CropStatus::Growing => "growing",
            CropStatus::Harvested => "harvested",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planted" => Some(CropStatus::Planted),
            "growing" => Some(CropStatus::Growing),
            "harvested" => Some(CropStatus::Harvested),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    #[serde(rename = "Id", default)]
    pub id: u32,
    pub farm_id: u32,
    pub variety: String,
    pub planting_date: NaiveDate,
    /// Strictly after `planting_date`
    pub expected_harvest: NaiveDate,
    /// Field label within the farm
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: CropStatus,
}

impl Crop {
    pub fn new(
        id: u32,
        farm_id: u32,
        variety: impl Into<String>,
        planting_date: NaiveDate,
        expected_harvest: NaiveDate,
        field: impl Into<String>,
    ) -> Self {
        Self {
            id,
            farm_id,
            variety: variety.into(),
            planting_date,
            expected_harvest,
            field: field.into(),
            notes: None,
            status: CropStatus::default(),
        }
    }

    /// Anything not yet harvested counts as active
    pub fn is_active(&self) -> bool {
        self.status != CropStatus::Harvested
    }
}

impl Entity for Crop {
    const TABLE: &'static str = "crops";
    const KIND: &'static str = "Crop";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "farmId",
        "variety",
        "plantingDate",
        "expectedHarvest",
        "field",
        "notes",
        "status",
    ];

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn farm_id(&self) -> Option<u32> {
        Some(self.farm_id)
    }

    fn on_create(&mut self, _now: DateTime<Utc>) {
        self.status = CropStatus::Planted;
    }
}
