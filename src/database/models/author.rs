use serde::{Deserialize, Serialize};

use crate::database::entity::Entity;
use crate::database::record::RecordId;
use crate::database::schema::{FieldDef, Schema};
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self { id: None, first_name: first_name.into(), last_name: last_name.into(), address: None }
    }
}

impl Entity for Author {
    const COLLECTION: &'static str = "authors";

    fn schema() -> Schema {
        Schema::new(Self::COLLECTION)
            .field(FieldDef::text("first_name").required().not_blank())
            .field(FieldDef::text("last_name").required().not_blank())
            .field(FieldDef::text("address"))
    }

    fn finders(schema: &Schema) -> Result<Vec<Finder>, FilterError> {
        Ok(vec![Finder::parse("findByLastNameIgnoreCase", schema)?])
    }

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }
}
