//! Form values and validation
//!
//! Forms hand back a flat map of strings keyed by camelCase attribute name.
//! Validation turns that map into a typed entity or a set of per-field
//! messages; nothing reaches a repository until it passes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use farmlog_data::domain::{
    AreaUnit, Crop, CropStatus, Expense, ExpenseCategory, Farm, Priority, Task, TaskStatus,
};
use thiserror::Error;

/// Raw field values as entered, keyed by attribute name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trimmed value, "" when the field was never set
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(|v| v.trim()).unwrap_or("")
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    fn optional(&self, field: &str) -> Option<String> {
        let value = self.get(field);
        (!value.is_empty()).then(|| value.to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Per-field messages, keyed like `FormValues`
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationError {
    pub errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    fn add(&mut self, field: &str, message: &str) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.to_string());
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

fn parse_date(values: &FormValues, field: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(values.get(field), "%Y-%m-%d").ok()
}

fn parse_positive(values: &FormValues, field: &str) -> Option<f64> {
    values
        .get(field)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
}

/// Resolve `farmId` against the loaded farms
fn farm_ref(values: &FormValues, farms: &[Farm], errors: &mut ValidationError) -> Option<u32> {
    let raw = values.get("farmId");
    if raw.is_empty() {
        errors.add("farmId", "Farm is required");
        return None;
    }
    match raw.parse::<u32>() {
        Ok(id) if farms.iter().any(|f| f.id == id) => Some(id),
        _ => {
            errors.add("farmId", "Selected farm does not exist");
            None
        }
    }
}

// ========================
// Farm
// ========================

pub fn validate_farm(values: &FormValues, id: u32) -> Result<Farm, ValidationError> {
    let mut errors = ValidationError::default();

    let name = values.get("name");
    if name.is_empty() {
        errors.add("name", "Farm name is required");
    }
    let location = values.get("location");
    if location.is_empty() {
        errors.add("location", "Location is required");
    }
    let size = parse_positive(values, "size");
    if size.is_none() {
        errors.add("size", "Valid size is required");
    }
    let unit = match values.get("unit") {
        "" => Some(AreaUnit::default()),
        raw => AreaUnit::from_str(raw),
    };
    if unit.is_none() {
        errors.add("unit", "Unit must be acres, hectares, sq ft or sq m");
    }

    errors.into_result(|| {
        Farm::new(id, name, location, size.unwrap_or_default(), unit.unwrap_or_default())
    })
}

pub fn farm_values(farm: &Farm) -> FormValues {
    FormValues::new()
        .with("name", farm.name.as_str())
        .with("location", farm.location.as_str())
        .with("size", farm.size.to_string())
        .with("unit", farm.unit.as_str())
}

// ========================
// Crop
// ========================

pub fn validate_crop(values: &FormValues, id: u32, farms: &[Farm]) -> Result<Crop, ValidationError> {
    let mut errors = ValidationError::default();

    let farm_id = farm_ref(values, farms, &mut errors);
    let variety = values.get("variety");
    if variety.is_empty() {
        errors.add("variety", "Crop variety is required");
    }
    let planting = parse_date(values, "plantingDate");
    if planting.is_none() {
        errors.add("plantingDate", "Planting date is required");
    }
    let harvest = parse_date(values, "expectedHarvest");
    match (planting, harvest) {
        (_, None) => errors.add("expectedHarvest", "Expected harvest date is required"),
        (Some(p), Some(h)) if h <= p => errors.add("expectedHarvest", "Harvest date must be after planting date"),
        _ => {}
    }
    let field = values.get("field");
    if field.is_empty() {
        errors.add("field", "Field location is required");
    }
    let status = match values.get("status") {
        "" => Some(CropStatus::default()),
        raw => CropStatus::from_str(raw),
    };
    if status.is_none() {
        errors.add("status", "Status must be planted, growing or harvested");
    }

    errors.into_result(|| {
        let mut crop = Crop::new(
            id,
            farm_id.unwrap_or_default(),
            variety,
            planting.unwrap_or_default(),
            harvest.unwrap_or_default(),
            field,
        );
        crop.notes = values.optional("notes");
        crop.status = status.unwrap_or_default();
        crop
    })
}

pub fn crop_values(crop: &Crop) -> FormValues {
    FormValues::new()
        .with("farmId", crop.farm_id.to_string())
        .with("variety", crop.variety.as_str())
        .with("plantingDate", crop.planting_date.to_string())
        .with("expectedHarvest", crop.expected_harvest.to_string())
        .with("field", crop.field.as_str())
        .with("notes", crop.notes.clone().unwrap_or_default())
        .with("status", crop.status.as_str())
}

// ========================
// Task
// ========================

pub fn validate_task(values: &FormValues, id: u32, farms: &[Farm], crops: &[Crop]) -> Result<Task, ValidationError> {
    let mut errors = ValidationError::default();

    let title = values.get("title");
    if title.is_empty() {
        errors.add("title", "Task title is required");
    }
    let due = parse_date(values, "dueDate");
    if due.is_none() {
        errors.add("dueDate", "Due date is required");
    }
    let farm_id = farm_ref(values, farms, &mut errors);

    let crop_id = match values.get("cropId") {
        "" => None,
        raw => match raw.parse::<u32>().ok().and_then(|id| crops.iter().find(|c| c.id == id)) {
            Some(crop) if farm_id.is_none() || farm_id == Some(crop.farm_id) => Some(crop.id),
            Some(_) => {
                errors.add("cropId", "Crop must belong to the selected farm");
                None
            }
            None => {
                errors.add("cropId", "Selected crop does not exist");
                None
            }
        },
    };

    let priority = match values.get("priority") {
        "" => Some(Priority::default()),
        raw => Priority::from_str(raw),
    };
    if priority.is_none() {
        errors.add("priority", "Priority must be low, medium or high");
    }
    let status = match values.get("status") {
        "" => Some(TaskStatus::default()),
        raw => TaskStatus::from_str(raw),
    };
    if status.is_none() {
        errors.add("status", "Unknown task status");
    }

    errors.into_result(|| {
        let mut task = Task::new(id, farm_id.unwrap_or_default(), title, due.unwrap_or_default());
        task.crop_id = crop_id;
        task.description = values.optional("description");
        task.priority = priority.unwrap_or_default();
        task.status = status.unwrap_or_default();
        task
    })
}

pub fn task_values(task: &Task) -> FormValues {
    FormValues::new()
        .with("title", task.title.as_str())
        .with("description", task.description.clone().unwrap_or_default())
        .with("dueDate", task.due_date.to_string())
        .with("priority", task.priority.as_str())
        .with("farmId", task.farm_id.to_string())
        .with("cropId", task.crop_id.map(|id| id.to_string()).unwrap_or_default())
        .with("status", task.status.as_str())
}

// ========================
// Expense
// ========================

pub fn validate_expense(values: &FormValues, id: u32, farms: &[Farm]) -> Result<Expense, ValidationError> {
    let mut errors = ValidationError::default();

    let amount = parse_positive(values, "amount");
    if amount.is_none() {
        errors.add("amount", "Valid amount is required");
    }
    let category = ExpenseCategory::from_str(values.get("category"));
    if category.is_none() {
        errors.add("category", "Category is required");
    }
    let date = parse_date(values, "date");
    if date.is_none() {
        errors.add("date", "Date is required");
    }
    let farm_id = farm_ref(values, farms, &mut errors);

    errors.into_result(|| {
        let mut expense = Expense::new(
            id,
            farm_id.unwrap_or_default(),
            amount.unwrap_or_default(),
            category.unwrap_or(ExpenseCategory::Other),
            date.unwrap_or_default(),
        );
        expense.notes = values.optional("notes");
        expense
    })
}

pub fn expense_values(expense: &Expense) -> FormValues {
    FormValues::new()
        .with("amount", expense.amount.to_string())
        .with("category", expense.category.as_str())
        .with("date", expense.date.to_string())
        .with("farmId", expense.farm_id.to_string())
        .with("notes", expense.notes.clone().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn farms() -> Vec<Farm> {
        vec![
            Farm::new(1, "Green Valley", "Fresno", 150.0, AreaUnit::Acres),
            Farm::new(2, "Sunrise", "Yakima", 42.0, AreaUnit::Hectares),
        ]
    }

    fn crops() -> Vec<Crop> {
        vec![Crop::new(10, 1, "Roma", d(2024, 3, 1), d(2024, 7, 1), "A1")]
    }

    #[test]
    fn test_farm_requires_fields() {
        let err = validate_farm(&FormValues::new().with("size", "-3"), 0).unwrap_err();
        assert_eq!(err.field("name"), Some("Farm name is required"));
        assert_eq!(err.field("location"), Some("Location is required"));
        assert_eq!(err.field("size"), Some("Valid size is required"));
        assert_eq!(err.field("unit"), None, "unit defaults to acres");
    }

    #[test]
    fn test_farm_trims_and_parses() {
        let values: FormValues = [("name", "  North  "), ("location", "Fresno"), ("size", "12.5"), ("unit", "sq m")]
            .into_iter()
            .collect();
        let farm = validate_farm(&values, 4).unwrap();
        assert_eq!(farm.id, 4);
        assert_eq!(farm.name, "North");
        assert_eq!(farm.unit, AreaUnit::SqM);
        assert_eq!(farm_values(&farm).get("size"), "12.5");
    }

    #[test]
    fn test_crop_harvest_must_follow_planting() {
        let base = FormValues::new()
            .with("farmId", "1")
            .with("variety", "Roma")
            .with("field", "A1")
            .with("plantingDate", "2024-03-01");

        let same_day = base.clone().with("expectedHarvest", "2024-03-01");
        let err = validate_crop(&same_day, 0, &farms()).unwrap_err();
        assert_eq!(err.field("expectedHarvest"), Some("Harvest date must be after planting date"));

        let earlier = base.clone().with("expectedHarvest", "2024-02-01");
        assert!(validate_crop(&earlier, 0, &farms()).is_err());

        let later = base.with("expectedHarvest", "2024-03-02");
        let crop = validate_crop(&later, 0, &farms()).unwrap();
        assert_eq!(crop.status, CropStatus::Planted);
        assert_eq!(crop.notes, None);
    }

    #[test]
    fn test_crop_unknown_farm() {
        let values = crop_values(&Crop::new(0, 9, "Kale", d(2024, 3, 1), d(2024, 5, 1), "B"));
        let err = validate_crop(&values, 0, &farms()).unwrap_err();
        assert_eq!(err.field("farmId"), Some("Selected farm does not exist"));
    }

    #[test]
    fn test_task_crop_must_belong_to_farm() {
        let values = FormValues::new()
            .with("title", "Irrigate")
            .with("dueDate", "2024-05-03")
            .with("farmId", "2")
            .with("cropId", "10");
        let err = validate_task(&values, 0, &farms(), &crops()).unwrap_err();
        assert_eq!(err.field("cropId"), Some("Crop must belong to the selected farm"));

        let ok = values.with("farmId", "1").with("priority", "high");
        let task = validate_task(&ok, 0, &farms(), &crops()).unwrap();
        assert_eq!(task.crop_id, Some(10));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.status, TaskStatus::Open);
    }

    #[test]
    fn test_task_requires_fields() {
        let err = validate_task(&FormValues::new(), 0, &farms(), &crops()).unwrap_err();
        assert_eq!(err.field("title"), Some("Task title is required"));
        assert_eq!(err.field("dueDate"), Some("Due date is required"));
        assert_eq!(err.field("farmId"), Some("Farm is required"));
        assert_eq!(err.to_string(), "3 field(s) failed validation");
    }

    #[test]
    fn test_task_values_prefill() {
        let mut task = Task::new(3, 1, "Prune", d(2024, 5, 3));
        task.crop_id = Some(10);
        let values = task_values(&task);
        let back = validate_task(&values, task.id, &farms(), &crops()).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_expense_validation() {
        let err = validate_expense(&FormValues::new().with("amount", "0"), 0, &farms()).unwrap_err();
        assert_eq!(err.field("amount"), Some("Valid amount is required"));
        assert_eq!(err.field("category"), Some("Category is required"));
        assert_eq!(err.field("date"), Some("Date is required"));

        let values = FormValues::new()
            .with("amount", "89.99")
            .with("category", "Fertilizer")
            .with("date", "2024-05-02")
            .with("farmId", "2")
            .with("notes", "  ");
        let expense = validate_expense(&values, 0, &farms()).unwrap();
        assert_eq!(expense.category, ExpenseCategory::Fertilizer);
        assert_eq!(expense.notes, None);
    }
}
