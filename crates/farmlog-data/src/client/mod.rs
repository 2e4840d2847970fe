//! Record Store Client
//!
//! The remote collaborator every `RemoteRepository` talks to. Any backend
//! that answers these five calls can store FarmLog data.

mod http;
mod types;

use async_trait::async_trait;

use crate::domain::DomainResult;

pub use http::HttpRecordClient;
pub use types::{
    DeleteRequest, FetchParams, FetchResponse, GetResponse, MutationResponse, Operator, RecordResult,
    RecordsRequest, WhereClause,
};

/// Generic table-oriented record store.
///
/// `Err` means the call never produced an envelope (network down, bad
/// response body). A store that answers but refuses reports it inside the
/// envelope with `success: false`.
#[async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> DomainResult<FetchResponse>;

    async fn get_record_by_id(&self, table: &str, id: u32, params: &FetchParams) -> DomainResult<GetResponse>;

    async fn create_record(&self, table: &str, request: &RecordsRequest) -> DomainResult<MutationResponse>;

    async fn update_record(&self, table: &str, request: &RecordsRequest) -> DomainResult<MutationResponse>;

    async fn delete_record(&self, table: &str, request: &DeleteRequest) -> DomainResult<MutationResponse>;
}
