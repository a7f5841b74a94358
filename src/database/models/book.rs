use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::entity::Entity;
use crate::database::models::author::Author;
use crate::database::record::RecordId;
use crate::database::relation::ForeignKey;
use crate::database::schema::{FieldDef, Schema};
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;
use crate::filter::types::{FilterOp, SortSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub book_name: String,
    #[serde(default)]
    pub book_author: Option<String>,
    #[serde(default)]
    pub author_id: Option<RecordId>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Each book points at its author through `author_id`.
pub const BOOK_AUTHOR: ForeignKey<Book, Author> = ForeignKey::new("author_id");

impl Book {
    pub fn new(book_name: impl Into<String>, book_author: impl Into<String>) -> Self {
        Self {
            id: None,
            book_name: book_name.into(),
            book_author: Some(book_author.into()),
            author_id: None,
            price: None,
        }
    }
}

impl Entity for Book {
    const COLLECTION: &'static str = "books";

    fn schema() -> Schema {
        Schema::new(Self::COLLECTION)
            .field(FieldDef::text("book_name").required().not_blank())
            .field(FieldDef::text("book_author"))
            .field(FieldDef::integer("author_id"))
            .field(FieldDef::decimal("price").min(0))
    }

    fn finders(schema: &Schema) -> Result<Vec<Finder>, FilterError> {
        let cheaper_first = Finder::by_op("price", FilterOp::Lte).order_by(SortSpec::asc("price"));
        cheaper_first.validate(schema)?;
        Ok(vec![
            Finder::parse("findByBookAuthor", schema)?,
            Finder::parse("findByBookNameContainingIgnoreCase", schema)?,
            cheaper_first,
        ])
    }

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }
}
