use serde::{Deserialize, Serialize};

use crate::database::entity::Entity;
use crate::database::record::RecordId;
use crate::database::schema::{FieldDef, Schema};
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;

/// Sign-up form data. Names and emails are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_name: String,
    pub user_email: String,
    #[serde(default)]
    pub check_me: bool,
}

impl User {
    pub fn new(user_name: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self { id: None, user_name: user_name.into(), user_email: user_email.into(), check_me: false }
    }
}

impl Entity for User {
    const COLLECTION: &'static str = "users";

    fn schema() -> Schema {
        Schema::new(Self::COLLECTION)
            .field(FieldDef::text("user_name").required().not_blank().size(3, 12).unique())
            .field(FieldDef::text("user_email").required().not_blank().email().unique())
            .field(FieldDef::boolean("check_me"))
    }

    fn finders(schema: &Schema) -> Result<Vec<Finder>, FilterError> {
        Ok(vec![
            Finder::parse("findByUserEmailIgnoreCase", schema)?,
            Finder::parse("existsByUserName", schema)?,
        ])
    }

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }
}
