//! Scripted [`RecordClient`] for adapter tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use stockroom_core::{StoreError, StoreResult};

use super::{FetchParams, RecordClient};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fetch { table: String, params: Value },
    Get { table: String, id: i64 },
    Create { table: String, records: Vec<Value> },
    Update { table: String, records: Vec<Value> },
    Delete { table: String, ids: Vec<i64> },
}

/// Replays queued responses in order and records every call.
/// An unscripted call fails with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    fetches: Mutex<VecDeque<StoreResult<Vec<Value>>>>,
    gets: Mutex<VecDeque<StoreResult<Value>>>,
    writes: Mutex<VecDeque<StoreResult<Vec<Value>>>>,
    deletes: Mutex<VecDeque<StoreResult<usize>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_fetch(self, result: StoreResult<Vec<Value>>) -> Self {
        self.fetches.lock().unwrap().push_back(result);
        self
    }

    pub fn on_get(self, result: StoreResult<Value>) -> Self {
        self.gets.lock().unwrap().push_back(result);
        self
    }

    pub fn on_write(self, result: StoreResult<Vec<Value>>) -> Self {
        self.writes.lock().unwrap().push_back(result);
        self
    }

    pub fn on_delete(self, result: StoreResult<usize>) -> Self {
        self.deletes.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next<T>(queue: &Mutex<VecDeque<StoreResult<T>>>) -> StoreResult<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(StoreError::transport("unscripted call")))
}

#[async_trait::async_trait]
impl RecordClient for ScriptedClient {
    async fn fetch_records(&self, table: &str, params: &FetchParams) -> StoreResult<Vec<Value>> {
        self.record(Call::Fetch {
            table: table.to_string(),
            params: serde_json::to_value(params).unwrap(),
        });
        next(&self.fetches)
    }

    async fn get_record_by_id(&self, table: &str, id: i64) -> StoreResult<Value> {
        self.record(Call::Get {
            table: table.to_string(),
            id,
        });
        next(&self.gets)
    }

    async fn create_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        self.record(Call::Create {
            table: table.to_string(),
            records,
        });
        next(&self.writes)
    }

    async fn update_records(&self, table: &str, records: Vec<Value>) -> StoreResult<Vec<Value>> {
        self.record(Call::Update {
            table: table.to_string(),
            records,
        });
        next(&self.writes)
    }

    async fn delete_records(&self, table: &str, ids: Vec<i64>) -> StoreResult<usize> {
        self.record(Call::Delete {
            table: table.to_string(),
            ids,
        });
        next(&self.deletes)
    }
}
