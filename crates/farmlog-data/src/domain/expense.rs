//! Expense Entity

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use super::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Seeds,
    Fertilizer,
    Equipment,
    Labor,
    Maintenance,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        ExpenseCategory::Seeds,
        ExpenseCategory::Fertilizer,
        ExpenseCategory::Equipment,
        ExpenseCategory::Labor,
        ExpenseCategory::Maintenance,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Seeds => "Seeds",
            ExpenseCategory::Fertilizer => "Fertilizer",
            ExpenseCategory::Equipment => "Equipment",
            ExpenseCategory::Labor => "Labor",
            ExpenseCategory::Maintenance => "Maintenance",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(rename = "Id", default)]
    pub id: u32,
    pub farm_id: u32,
    /// Always positive
    pub amount: f64,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn new(id: u32, farm_id: u32, amount: f64, category: ExpenseCategory, date: NaiveDate) -> Self {
        Self {
            id,
            farm_id,
            amount,
            category,
            date,
            notes: None,
            created_at: None,
        }
    }

    /// True when the expense falls in the given calendar month
    pub fn in_month(&self, year: i32, month: u32) -> bool {
        self.date.year() == year && self.date.month() == month
    }
}

impl Entity for Expense {
    const TABLE: &'static str = "expenses";
    const KIND: &'static str = "Expense";
    const FIELDS: &'static [&'static str] = &["Id", "farmId", "amount", "category", "date", "notes", "createdAt"];

    fn id(&self) -> u32 {
        self.id
    }

    fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    fn farm_id(&self) -> Option<u32> {
        Some(self.farm_id)
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
