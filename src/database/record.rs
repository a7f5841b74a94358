use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Identity of a stored record, unique within its collection.
pub type RecordId = i64;

/// Name of the identity field on the wire and in predicates.
pub const ID_FIELD: &str = "id";

/// Errors that can occur while building a Record from input
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
    #[error("Invalid record id: {0}")]
    InvalidId(String),
}

/// A dynamic record: an optional identity plus named JSON fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: RecordId) -> Self {
        Self { id: Some(id), fields: Map::new() }
    }

    /// Build a record from a JSON object. An `id` key becomes the identity.
    pub fn from_json(json: Value) -> Result<Self, RecordError> {
        match json {
            Value::Object(mut map) => {
                let id = match map.remove(ID_FIELD) {
                    None | Some(Value::Null) => None,
                    Some(Value::Number(n)) => Some(
                        n.as_i64().ok_or_else(|| RecordError::InvalidId(n.to_string()))?,
                    ),
                    Some(other) => return Err(RecordError::InvalidId(other.to_string())),
                };
                Ok(Self { id, fields: map })
            }
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        if let Some(id) = self.id {
            map.insert(ID_FIELD.to_string(), Value::from(id));
        }
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<RecordId>) -> &mut Self {
        self.id = id;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Value of a field for predicate evaluation; `id` resolves to the identity
    /// and missing fields read as null.
    pub fn field_value(&self, key: &str) -> Cow<'_, Value> {
        if key == ID_FIELD {
            return Cow::Owned(self.id.map(Value::from).unwrap_or(Value::Null));
        }
        match self.fields.get(key) {
            Some(v) => Cow::Borrowed(v),
            None => Cow::Owned(Value::Null),
        }
    }

    /// Set a field value. The identity cannot be set through here.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if key == ID_FIELD {
            tracing::warn!("Attempted to set identity through set() - ignoring");
            return self;
        }
        self.fields.insert(key, value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Apply a partial update; the identity key is never overwritten.
    pub fn merge(&mut self, changes: Map<String, Value>) -> &mut Self {
        for (key, value) in changes {
            self.set(key, value);
        }
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub(crate) fn from_parts(id: RecordId, fields: Map<String, Value>) -> Self {
        Self { id: Some(id), fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_extracts_identity() {
        let record = Record::from_json(json!({"id": 7, "book_name": "Dune"})).unwrap();
        assert_eq!(record.id(), Some(7));
        assert_eq!(record.get("book_name"), Some(&json!("Dune")));
        assert!(record.get("id").is_none());
    }

    #[test]
    fn from_json_rejects_non_objects_and_bad_ids() {
        assert!(matches!(Record::from_json(json!([1, 2])), Err(RecordError::InvalidJson(_))));
        assert!(matches!(Record::from_json(json!({"id": "x"})), Err(RecordError::InvalidId(_))));
        assert!(matches!(Record::from_json(json!({"id": 1.5})), Err(RecordError::InvalidId(_))));
    }

    #[test]
    fn serde_matches_to_json() {
        let record = Record::from_json(json!({"id": 3, "marks": 90})).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), record.to_json());
        let back: Record = serde_json::from_value(record.to_json()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn merge_never_touches_identity() {
        let mut record = Record::with_id(1);
        record.set("grade", "A");
        let mut changes = Map::new();
        changes.insert("id".into(), json!(99));
        changes.insert("grade".into(), json!("B"));
        record.merge(changes);
        assert_eq!(record.id(), Some(1));
        assert_eq!(record.get("grade"), Some(&json!("B")));
    }

    #[test]
    fn field_value_reads_identity_and_missing_as_null() {
        let record = Record::with_id(4);
        assert_eq!(*record.field_value("id"), json!(4));
        assert_eq!(*record.field_value("absent"), Value::Null);
    }
}
