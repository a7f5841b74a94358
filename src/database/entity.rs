use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::error::RepositoryError;
use crate::database::record::{Record, RecordId};
use crate::database::schema::Schema;
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;

/// A typed model stored in one collection.
///
/// Conversion to and from [`Record`] goes through serde: the `id` key of the
/// serialized form is the identity, every other key is a field.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name, also used in URLs.
    const COLLECTION: &'static str;

    fn schema() -> Schema;

    /// Finders declared for this entity, resolved against its schema.
    fn finders(_schema: &Schema) -> Result<Vec<Finder>, FilterError> {
        Ok(vec![])
    }

    fn id(&self) -> Option<RecordId>;

    fn set_id(&mut self, id: Option<RecordId>);

    fn to_record(&self) -> Result<Record, RepositoryError> {
        Ok(Record::from_json(serde_json::to_value(self)?)?)
    }

    fn from_record(record: Record) -> Result<Self, RepositoryError> {
        Ok(serde_json::from_value(record.to_json())?)
    }
}
