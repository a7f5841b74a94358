use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::record::Record;
use crate::pager::Page;

/// Wire envelope shared by every JSON response:
/// `{ success, message, data, timestamp }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self { success: true, message: message.into(), data: Some(data), timestamp: Utc::now() }
    }
}

/// Records go out as flat JSON objects; `id` is an ordinary key.
pub fn record_to_api_value(record: &Record) -> Value {
    record.to_json()
}

pub fn records_to_api_value(records: &[Record]) -> Vec<Value> {
    records.iter().map(record_to_api_value).collect()
}

pub fn page_to_api_value(page: Page<Record>) -> Page<Value> {
    page.map(|record| record.to_json())
}
