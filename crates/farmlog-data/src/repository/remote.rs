//! Remote Repository Implementation
//!
//! Repository<T> over a `RecordClient`. Reads are fail-soft: anything that
//! goes wrong is logged (and surfaced through the notifier when the store
//! answered `success: false`) and the caller sees an empty result.
//! Writes propagate `DomainError::Persistence`.

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::traits::{is_upcoming, upcoming_window_end, ExpenseRepository, Repository, TaskRepository};
use crate::client::{
    DeleteRequest, FetchParams, MutationResponse, Operator, RecordClient, RecordResult, RecordsRequest,
};
use crate::domain::{DomainError, DomainResult, Entity, Expense, RecordFailure, Task};
use crate::notify::Notifier;

pub struct RemoteRepository<T: Entity> {
    client: Option<Arc<dyn RecordClient>>,
    notifier: Arc<dyn Notifier>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> RemoteRepository<T> {
    /// `client` may be absent; reads then come back empty and writes fail
    /// with `DomainError::Unavailable`.
    pub fn new(client: Option<Arc<dyn RecordClient>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            _marker: PhantomData,
        }
    }

    fn base_params() -> FetchParams {
        FetchParams::with_fields(T::FIELDS)
    }

    fn farm_params(farm_id: u32) -> FetchParams {
        Self::base_params().filter("farmId", Operator::EqualTo, farm_id)
    }

    fn require_client(&self) -> DomainResult<&Arc<dyn RecordClient>> {
        self.client
            .as_ref()
            .ok_or_else(|| DomainError::Unavailable(format!("no record client configured for {}", T::TABLE)))
    }

    /// Fetch with the given query, propagating every failure
    async fn try_fetch(&self, params: &FetchParams) -> DomainResult<Vec<T>> {
        let client = self.require_client()?;
        let response = client.fetch_records(T::TABLE, params).await?;
        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| format!("Failed to load {}", T::TABLE));
            return Err(DomainError::Fetch(message));
        }
        Ok(response.data.into_iter().filter_map(decode::<T>).collect())
    }

    /// Fetch with the given query, degrading every failure to an empty list
    async fn fetch(&self, params: &FetchParams) -> Vec<T> {
        match self.try_fetch(params).await {
            Ok(records) => records,
            Err(DomainError::Fetch(message)) => {
                log::warn!("Fetching {} rejected: {}", T::TABLE, message);
                self.notifier.error(&message);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Fetching {} failed, list is empty: {}", T::TABLE, e);
                Vec::new()
            }
        }
    }

    /// Turn a mutation call's outcome into an accepted envelope or a
    /// persistence error
    fn accept(&self, verb: &str, outcome: DomainResult<MutationResponse>) -> DomainResult<MutationResponse> {
        let response = outcome.map_err(|e| {
            log::error!("{} {} failed: {}", verb, T::KIND, e);
            e
        })?;

        if !response.success {
            let message = response
                .message
                .clone()
                .unwrap_or_else(|| format!("{} {} rejected", verb, T::KIND));
            log::error!("{}", message);
            self.notifier.error(&message);
            return Err(DomainError::persistence(message));
        }
        Ok(response)
    }

    /// Apply the batch rule: report every failed record, return the first
    /// successful one
    fn first_success(&self, verb: &str, response: MutationResponse) -> DomainResult<T> {
        let mut failures: Vec<RecordFailure> = Vec::new();
        let mut first: Option<T> = None;

        for result in response.results {
            if !result.success {
                let failure = result.failure();
                for line in failure.lines() {
                    log::error!("{} {} record failed: {}", verb, T::KIND, line);
                    self.notifier.error(&line);
                }
                failures.push(failure);
                continue;
            }
            if first.is_none() {
                first = result.data.and_then(decode::<T>);
            }
        }

        first.ok_or_else(|| DomainError::Persistence {
            message: format!("{} {} returned no record", verb, T::KIND),
            failures,
        })
    }
}

/// A failed delete result that only says the id was not there
fn is_missing(result: &RecordResult) -> bool {
    result.errors.is_empty()
        && result
            .message
            .as_deref()
            .is_some_and(|m| m.to_ascii_lowercase().contains("not found"))
}

fn decode<T: Entity>(value: Value) -> Option<T> {
    match serde_json::from_value::<T>(value) {
        Ok(entity) => Some(entity),
        Err(e) => {
            log::warn!("Skipping malformed {} record: {}", T::KIND, e);
            None
        }
    }
}

fn encode<T: Entity>(entity: &T, keep_id: bool) -> DomainResult<Value> {
    let mut value = serde_json::to_value(entity)?;
    if !keep_id {
        if let Value::Object(map) = &mut value {
            map.remove("Id");
        }
    }
    Ok(value)
}

#[async_trait]
impl<T: Entity> Repository<T> for RemoteRepository<T> {
    async fn create(&self, entity: &T) -> DomainResult<T> {
        let request = RecordsRequest {
            records: vec![encode(entity, false)?],
        };
        let client = self.require_client()?;
        let response = self.accept("Create", client.create_record(T::TABLE, &request).await)?;
        let created = self.first_success("Create", response)?;
        log::info!("Created {} {}", T::KIND, created.id());
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<T>> {
        let Some(client) = self.client.as_ref() else {
            log::warn!("No record client configured, {} {} treated as absent", T::KIND, id);
            return Ok(None);
        };
        match client.get_record_by_id(T::TABLE, id, &Self::base_params()).await {
            Ok(response) => Ok(response.data.and_then(decode::<T>)),
            Err(e) => {
                log::warn!("Fetching {} {} failed: {}", T::KIND, id, e);
                Ok(None)
            }
        }
    }

    async fn list(&self) -> DomainResult<Vec<T>> {
        Ok(self.fetch(&Self::base_params()).await)
    }

    async fn update(&self, entity: &T) -> DomainResult<T> {
        let request = RecordsRequest {
            records: vec![encode(entity, true)?],
        };
        let client = self.require_client()?;
        let response = self.accept("Update", client.update_record(T::TABLE, &request).await)?;
        self.first_success("Update", response)
    }

    async fn delete(&self, id: u32) -> DomainResult<bool> {
        let request = DeleteRequest { record_ids: vec![id] };
        let client = self.require_client()?;
        let response = self.accept("Delete", client.delete_record(T::TABLE, &request).await)?;

        let mut removed = false;
        for result in response.results {
            if result.success {
                removed = true;
            } else if is_missing(&result) {
                log::warn!("Delete {} {}: nothing to delete", T::KIND, id);
            } else {
                for line in result.failure().lines() {
                    log::error!("Delete {} {} failed: {}", T::KIND, id, line);
                    self.notifier.error(&line);
                }
            }
        }
        if removed {
            log::info!("Deleted {} {}", T::KIND, id);
        }
        Ok(removed)
    }

    async fn list_by_farm(&self, farm_id: u32) -> DomainResult<Vec<T>> {
        Ok(self.fetch(&Self::farm_params(farm_id)).await)
    }

    async fn list_by_farm_strict(&self, farm_id: u32) -> DomainResult<Vec<T>> {
        self.try_fetch(&Self::farm_params(farm_id)).await
    }
}

#[async_trait]
impl TaskRepository for RemoteRepository<Task> {
    async fn upcoming(&self, window_days: u32, today: NaiveDate) -> DomainResult<Vec<Task>> {
        let end = upcoming_window_end(window_days, today);
        let params = Self::base_params()
            .filter("dueDate", Operator::GreaterThanOrEqualTo, today.to_string())
            .filter("dueDate", Operator::LessThanOrEqualTo, end.to_string());
        let tasks = self.fetch(&params).await;
        Ok(tasks
            .into_iter()
            .filter(|t| is_upcoming(t, window_days, today))
            .collect())
    }
}

#[async_trait]
impl ExpenseRepository for RemoteRepository<Expense> {
    async fn monthly_total(&self, year: i32, month: u32) -> DomainResult<f64> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Err(DomainError::InvalidInput(format!("invalid month {}-{}", year, month)));
        };
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(first);
        let params = Self::base_params()
            .filter("date", Operator::GreaterThanOrEqualTo, first.to_string())
            .filter("date", Operator::LessThanOrEqualTo, last.to_string());
        let expenses = self.fetch(&params).await;
        Ok(expenses
            .iter()
            .filter(|e| e.in_month(year, month))
            .map(|e| e.amount)
            .sum())
    }
}
