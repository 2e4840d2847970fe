//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has no storage or network dependencies beyond the error
//! conversions in `entity`.

mod entity;
mod farm;
mod crop;
mod task;
mod expense;

pub use entity::{DomainError, DomainResult, Entity, FieldError, RecordFailure};
pub use farm::{AreaUnit, Farm};
pub use crop::{Crop, CropStatus};
pub use task::{Priority, Task, TaskStatus};
pub use expense::{Expense, ExpenseCategory};
