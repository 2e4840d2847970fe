//! Bundled seed data for the local store

const FARMS: &str = include_str!("../../fixtures/farms.json");
const CROPS: &str = include_str!("../../fixtures/crops.json");
const TASKS: &str = include_str!("../../fixtures/tasks.json");
const EXPENSES: &str = include_str!("../../fixtures/expenses.json");

/// Seed JSON array for a collection, if one is bundled
pub fn fixture(table: &str) -> Option<&'static str> {
    match table {
        "farms" => Some(FARMS),
        "crops" => Some(CROPS),
        "tasks" => Some(TASKS),
        "expenses" => Some(EXPENSES),
        _ => None,
    }
}
