//! Generic record store protocol.
//!
//! The hosted store exposes tables of JSON records behind a fetch/CRUD API. This
//! module holds the request/response shapes; [`client`] talks HTTP and [`wire`]
//! maps rows to domain records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_core::{StoreError, StoreResult};

pub mod client;
pub mod wire;

#[cfg(test)]
pub(crate) mod scripted;

pub use client::{HttpRecordClient, RecordClient};

/// Query for `fetch_records`: projected fields, ordering and filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchParams {
    pub fields: Vec<FieldRef>,
    #[serde(rename = "orderBy", skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl FetchParams {
    pub fn fields(names: &[&str]) -> Self {
        Self {
            fields: names.iter().map(|n| FieldRef::new(n)).collect(),
            ..Self::default()
        }
    }

    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by.push(OrderBy {
            field_name: field.to_string(),
            sort_type: order,
        });
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }
}

/// Serialised as `{ "field": { "Name": "<name>" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRef {
    field: FieldName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct FieldName {
    #[serde(rename = "Name")]
    name: String,
}

impl FieldRef {
    pub fn new(name: &str) -> Self {
        Self {
            field: FieldName {
                name: name.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(rename = "sorttype")]
    pub sort_type: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    EqualTo,
    LessThanOrEqualTo,
    GreaterThanOrEqualTo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    #[serde(rename = "FieldName")]
    pub field_name: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field_name: field.to_string(),
            operator,
            values: vec![value.into()],
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub results: Option<Vec<RecordResult>>,
}

/// Per-record outcome of a create/update/delete batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    #[serde(rename = "fieldLabel", default)]
    pub field_label: String,
    #[serde(default)]
    pub message: String,
}

impl RecordResult {
    fn rejection(&self) -> String {
        if let Some(e) = self.errors.first() {
            return format!("{}: {}", e.field_label, e.message);
        }
        self.message
            .clone()
            .unwrap_or_else(|| "record rejected".to_string())
    }
}

impl Envelope {
    fn ensure_success(&self) -> StoreResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(StoreError::rejected(
                self.message
                    .clone()
                    .unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }

    /// The `data` payload of a successful fetch/get.
    pub fn into_data(self) -> StoreResult<Value> {
        self.ensure_success()?;
        self.data
            .ok_or_else(|| StoreError::decode("response carried no data"))
    }

    /// The `data` of every per-record result, failing on the first rejected record.
    ///
    /// An envelope with no `results` list yields an empty vector.
    pub fn into_results(self) -> StoreResult<Vec<Value>> {
        self.ensure_success()?;
        let results = self.results.unwrap_or_default();

        if let Some(failed) = results.iter().find(|r| !r.success) {
            let rejected = results.iter().filter(|r| !r.success).count();
            tracing::error!(rejected, detail = %failed.rejection(), "record store rejected records");
            return Err(StoreError::rejected(failed.rejection()));
        }

        Ok(results.into_iter().filter_map(|r| r.data).collect())
    }
}
