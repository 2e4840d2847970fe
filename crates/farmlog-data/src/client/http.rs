//! HTTP Record Client
//!
//! Talks to the record store over JSON/HTTP:
//!
//! | operation          | method | path                          |
//! |--------------------|--------|-------------------------------|
//! | fetch_records      | POST   | `/tables/{table}/query`       |
//! | get_record_by_id   | GET    | `/tables/{table}/records/{id}`|
//! | create_record      | POST   | `/tables/{table}/records`     |
//! | update_record      | PATCH  | `/tables/{table}/records`     |
//! | delete_record      | DELETE | `/tables/{table}/records`     |

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{DeleteRequest, FetchParams, FetchResponse, GetResponse, MutationResponse, RecordsRequest};
use super::RecordClient;
use crate::domain::{DomainError, DomainResult};

pub struct HttpRecordClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRecordClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, table: &str, suffix: &str) -> String {
        format!("{}/tables/{}/{}", self.base_url, table, suffix)
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<R: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> DomainResult<R> {
        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Fetch(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| DomainError::Internal(format!("Invalid response body: {}", e)))
    }

    async fn send_json<B: Serialize + ?Sized + Sync, R: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> DomainResult<R> {
        self.send(self.request(method, url).json(body)).await
    }
}

#[async_trait]
impl RecordClient for HttpRecordClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> DomainResult<FetchResponse> {
        self.send_json(Method::POST, &self.url(table, "query"), params).await
    }

    async fn get_record_by_id(&self, table: &str, id: u32, params: &FetchParams) -> DomainResult<GetResponse> {
        let url = self.url(table, &format!("records/{}", id));
        let builder = self
            .request(Method::GET, &url)
            .query(&[("fields", params.fields.join(","))]);
        self.send(builder).await
    }

    async fn create_record(&self, table: &str, request: &RecordsRequest) -> DomainResult<MutationResponse> {
        self.send_json(Method::POST, &self.url(table, "records"), request).await
    }

    async fn update_record(&self, table: &str, request: &RecordsRequest) -> DomainResult<MutationResponse> {
        self.send_json(Method::PATCH, &self.url(table, "records"), request).await
    }

    async fn delete_record(&self, table: &str, request: &DeleteRequest) -> DomainResult<MutationResponse> {
        self.send_json(Method::DELETE, &self.url(table, "records"), request).await
    }
}
