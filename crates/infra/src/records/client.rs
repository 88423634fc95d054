use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};

use stockroom_core::{StoreError, StoreResult};

use super::{Envelope, FetchParams};
use crate::config::{ConfigError, RemoteConfig};

/// Table-level access to the hosted record store.
///
/// Rows travel as raw JSON; mapping to domain records happens in the adapters.
#[async_trait::async_trait]
pub trait RecordClient: Send + Sync {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> StoreResult<Vec<Value>>;

    /// `StoreError::NotFound` when the store has no record with `id`.
    async fn get_record_by_id(&self, table: &str, id: i64) -> StoreResult<Value>;

    async fn create_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>>;

    /// Each record must carry its `Id`.
    async fn update_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>>;

    /// Returns how many records the store reports deleted.
    async fn delete_records(&self, table: &str, ids: Vec<i64>) -> StoreResult<usize>;
}

#[async_trait::async_trait]
impl<S> RecordClient for Arc<S>
where
    S: RecordClient + ?Sized,
{
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> StoreResult<Vec<Value>> {
        (**self).fetch_records(table, params).await
    }

    async fn get_record_by_id(&self, table: &str, id: i64) -> StoreResult<Value> {
        (**self).get_record_by_id(table, id).await
    }

    async fn create_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        (**self).create_records(table, records).await
    }

    async fn update_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        (**self).update_records(table, records).await
    }

    async fn delete_records(&self, table: &str, ids: Vec<i64>) -> StoreResult<usize> {
        (**self).delete_records(table, ids).await
    }
}

/// JSON-over-HTTP [`RecordClient`].
///
/// Project id and public key go out as `X-Project-Id` / `X-Public-Key` on every
/// request; the configured timeout bounds each request end to end.
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    client: Client,
    base_url: String,
}

impl HttpRecordClient {
    pub fn from_config(config: &RemoteConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert("x-project-id", header_value("STOCKROOM_PROJECT_ID", &config.project_id)?);
        headers.insert("x-public-key", header_value("STOCKROOM_PUBLIC_KEY", &config.public_key)?);

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "STOCKROOM_RECORDS_URL",
                value: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.base_url, table)
    }

    async fn send(&self, method: Method, url: String, body: Option<Value>) -> StoreResult<(StatusCode, Envelope)> {
        tracing::debug!(%method, %url, "record store request");

        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::transport(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| StoreError::transport(e.to_string()))?;

        match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) => Ok((status, envelope)),
            Err(_) if !status.is_success() => Err(StoreError::transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            ))),
            Err(e) => Err(StoreError::decode(format!("malformed response envelope: {e}"))),
        }
    }
}

fn header_value(key: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait::async_trait]
impl RecordClient for HttpRecordClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> StoreResult<Vec<Value>> {
        let body = serde_json::to_value(params).map_err(|e| StoreError::decode(e.to_string()))?;
        let url = format!("{}/query", self.records_url(table));
        let (_, envelope) = self.send(Method::POST, url, Some(body)).await?;

        match envelope.into_data()? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::decode(format!("expected a list of records, got {other}"))),
        }
    }

    async fn get_record_by_id(&self, table: &str, id: i64) -> StoreResult<Value> {
        let url = format!("{}/{}", self.records_url(table), id);
        let (status, envelope) = self.send(Method::GET, url, None).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(table, id));
        }
        match envelope.into_data()? {
            Value::Null => Err(StoreError::not_found(table, id)),
            row => Ok(row),
        }
    }

    async fn create_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        let body = json!({ "records": records });
        let (_, envelope) = self.send(Method::POST, self.records_url(table), Some(body)).await?;
        envelope.into_results()
    }

    async fn update_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        let body = json!({ "records": records });
        let (_, envelope) = self.send(Method::PATCH, self.records_url(table), Some(body)).await?;
        envelope.into_results()
    }

    async fn delete_records(&self, table: &str, ids: Vec<i64>) -> StoreResult<usize> {
        let requested = ids.len();
        let body = json!({ "RecordIds": ids });
        let (_, envelope) = self.send(Method::DELETE, self.records_url(table), Some(body)).await?;

        // Stores that skip per-record results confirm the whole batch.
        let deleted = envelope.results.as_ref().map_or(requested, Vec::len);
        envelope.into_results()?;
        Ok(deleted)
    }
}
