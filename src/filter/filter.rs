use serde_json::Value;
use std::sync::Arc;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{BoundPredicate, FilterData, SortSpec};
use crate::database::record::Record;
use crate::database::schema::Schema;

/// A validated selection over one collection: predicate, ordering and limit.
#[derive(Debug, Clone)]
pub struct Filter {
    schema: Arc<Schema>,
    predicate: BoundPredicate,
    order: SortSpec,
    limit: Option<usize>,
}

impl Filter {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            predicate: BoundPredicate::match_all(),
            order: SortSpec::unsorted(),
            limit: None,
        }
    }

    pub fn assign(&mut self, data: FilterData) -> Result<&mut Self, FilterError> {
        if let Some(where_clause) = data.where_clause { self.where_clause(where_clause)?; }
        if let Some(order) = data.order { self.order(order)?; }
        if let Some(limit) = data.limit { self.limit(limit); }
        Ok(self)
    }

    /// Parses the JSON where-language.
    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        let max_chains = crate::config::CONFIG.pager.max_where_chains;
        self.predicate = FilterWhere::parse(&conditions, &self.schema, max_chains)?;
        Ok(self)
    }

    pub fn predicate(&mut self, predicate: BoundPredicate) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&predicate, &self.schema)?;
        self.predicate = predicate;
        Ok(self)
    }

    pub fn order(&mut self, order_spec: Value) -> Result<&mut Self, FilterError> {
        let spec = FilterOrder::validate_and_parse(&order_spec)?;
        self.sort(spec)
    }

    pub fn sort(&mut self, spec: SortSpec) -> Result<&mut Self, FilterError> {
        FilterOrder::validate(&spec, &self.schema)?;
        self.order = spec;
        Ok(self)
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn bound_predicate(&self) -> &BoundPredicate {
        &self.predicate
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.order
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    pub fn matches(&self, record: &Record) -> bool {
        FilterWhere::matches(&self.predicate, record, &self.schema)
    }

    /// Keeps matching records, sorts them and applies the limit. Input order is
    /// preserved among records the sort considers equal.
    pub fn apply(&self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let mut out: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        FilterOrder::sort(&mut out, &self.order, &self.schema);
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}
