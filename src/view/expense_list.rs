//! Expense tracker screen

use chrono::{Datelike, NaiveDate};
use farmlog_data::domain::{Expense, ExpenseCategory, Farm};
use farmlog_data::repository::Repository;

use super::{mutation_failed, CancelHandle, LoadState, ScreenError};
use crate::context::AppContext;
use crate::forms::{validate_expense, FormValues};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub farm_id: Option<u32>,
    pub category: Option<ExpenseCategory>,
    /// (year, month)
    pub month: Option<(i32, u32)>,
}

impl ExpenseFilter {
    /// Parse a month picker value such as `2024-05`
    pub fn parse_month(value: &str) -> Option<(i32, u32)> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()?;
        Some((date.year(), date.month()))
    }

    /// Matching expenses, newest first
    pub fn apply(&self, expenses: &[Expense]) -> Vec<Expense> {
        let mut visible: Vec<Expense> = expenses
            .iter()
            .filter(|e| self.farm_id.is_none_or(|id| e.farm_id == id))
            .filter(|e| self.category.is_none_or(|c| e.category == c))
            .filter(|e| self.month.is_none_or(|(y, m)| e.in_month(y, m)))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.date.cmp(&a.date));
        visible
    }
}

/// Summary panel figures over the filtered expenses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseTotals {
    pub total: f64,
    pub count: usize,
    pub average: f64,
    /// Largest category first
    pub by_category: Vec<(ExpenseCategory, f64)>,
}

impl ExpenseTotals {
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        let count = expenses.len();

        let mut by_category: Vec<(ExpenseCategory, f64)> = ExpenseCategory::ALL
            .into_iter()
            .map(|c| {
                let sum = expenses.iter().filter(|e| e.category == c).map(|e| e.amount).sum();
                (c, sum)
            })
            .filter(|(c, _)| expenses.iter().any(|e| e.category == *c))
            .collect();
        by_category.sort_by(|a, b| b.1.total_cmp(&a.1));

        Self {
            total,
            count,
            average: if count == 0 { 0.0 } else { total / count as f64 },
            by_category,
        }
    }
}

pub struct ExpenseList {
    ctx: AppContext,
    cancel: CancelHandle,
    pub state: LoadState,
    pub expenses: Vec<Expense>,
    pub farms: Vec<Farm>,
    pub filter: ExpenseFilter,
}

impl ExpenseList {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            cancel: CancelHandle::new(),
            state: LoadState::Idle,
            expenses: Vec::new(),
            farms: Vec::new(),
            filter: ExpenseFilter::default(),
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub async fn load(&mut self) -> Result<(), ScreenError> {
        let ticket = self.cancel.begin();
        self.state = LoadState::Loading;

        let result = tokio::try_join!(self.ctx.expenses.list(), self.ctx.farms.list());
        if !ticket.is_current() {
            log::debug!("Discarding stale expense load");
            return Err(ScreenError::Cancelled);
        }

        match result {
            Ok((expenses, farms)) => {
                self.expenses = expenses;
                self.farms = farms;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                log::error!("Expense loading error: {}", e);
                self.state = LoadState::Failed("Failed to load expenses".to_string());
                Err(ScreenError::Load {
                    message: "Failed to load expenses".to_string(),
                    source: e,
                })
            }
        }
    }

    pub async fn retry(&mut self) -> Result<(), ScreenError> {
        self.load().await
    }

    async fn reload_after_mutation(&mut self) {
        if let Err(e) = self.load().await {
            log::warn!("Reload after expense change failed: {}", e);
        }
    }

    pub fn visible(&self) -> Vec<Expense> {
        self.filter.apply(&self.expenses)
    }

    pub fn totals(&self) -> ExpenseTotals {
        ExpenseTotals::from_expenses(&self.visible())
    }

    pub fn farm_name(&self, farm_id: u32) -> &str {
        self.farms
            .iter()
            .find(|f| f.id == farm_id)
            .map(|f| f.name.as_str())
            .unwrap_or("Unknown Farm")
    }

    pub async fn save(&mut self, values: &FormValues, editing: Option<u32>) -> Result<Expense, ScreenError> {
        let expense = validate_expense(values, editing.unwrap_or(0), &self.farms)?;

        let result = match editing {
            Some(_) => self.ctx.expenses.update(&expense).await,
            None => self.ctx.expenses.create(&expense).await,
        };
        let saved = result.map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to save expense", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success(match editing {
            Some(_) => "Expense updated successfully",
            None => "Expense recorded successfully",
        });
        Ok(saved)
    }

    pub async fn delete(&mut self, id: u32) -> Result<bool, ScreenError> {
        let removed = self
            .ctx
            .expenses
            .delete(id)
            .await
            .map_err(|e| mutation_failed(self.ctx.notifier.as_ref(), "Failed to delete expense", e))?;

        self.reload_after_mutation().await;
        self.ctx.notifier.success("Expense deleted successfully");
        Ok(removed)
    }
}
