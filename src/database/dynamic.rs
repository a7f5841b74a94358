//! Repository over one collection of untyped records.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::database::error::RepositoryError;
use crate::database::record::{Record, RecordId};
use crate::database::schema::Schema;
use crate::database::store::MemoryStore;
use crate::filter::filter_order::FilterOrder;
use crate::filter::finder::{Finder, FinderKind};
use crate::filter::{Filter, SortSpec};
use crate::pager::{self, Page, PageRequest};

/// Outcome of running a finder, shaped by its verb.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FinderResult {
    Records(Vec<Record>),
    Count(usize),
    Exists(bool),
}

#[derive(Debug, Clone)]
pub struct DynamicRepository {
    collection: String,
    schema: Arc<Schema>,
    store: MemoryStore,
}

impl DynamicRepository {
    /// Opens a repository over a registered collection.
    pub async fn open(store: MemoryStore, collection: &str) -> Result<Self, RepositoryError> {
        let schema = store.schema(collection).await?;
        Ok(Self { collection: collection.to_string(), schema, store })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Inserts or fully replaces one record.
    pub async fn save(&self, record: Record) -> Result<Record, RepositoryError> {
        self.store.write().await.save(&self.collection, record)
    }

    /// Saves every record or none: the first failure rolls the batch back.
    pub async fn save_all(&self, records: Vec<Record>) -> Result<Vec<Record>, RepositoryError> {
        let mut tx = self.store.begin().await;
        let mut saved = Vec::with_capacity(records.len());
        for record in records {
            saved.push(tx.save(&self.collection, record)?);
        }
        tx.commit();
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<Record>, RepositoryError> {
        self.store.read().await.find_by_id(&self.collection, id)
    }

    /// Like [`find_by_id`](Self::find_by_id) but absence is NotFound.
    pub async fn get_by_id(&self, id: RecordId) -> Result<Record, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(&self.collection, id))
    }

    pub async fn find_all(&self) -> Result<Vec<Record>, RepositoryError> {
        self.store.read().await.scan(&self.collection)
    }

    pub async fn find_all_sorted(&self, sort: &SortSpec) -> Result<Vec<Record>, RepositoryError> {
        FilterOrder::validate(sort, &self.schema)?;
        let mut records = self.find_all().await?;
        FilterOrder::sort(&mut records, sort, &self.schema);
        Ok(records)
    }

    pub async fn find_page(&self, request: &PageRequest) -> Result<Page<Record>, RepositoryError> {
        let records = self.find_all().await?;
        Ok(pager::paginate_records(records, request, &self.schema)?)
    }

    /// Runs a prepared filter over the collection.
    pub async fn select(&self, filter: &Filter) -> Result<Vec<Record>, RepositoryError> {
        Ok(filter.apply(self.find_all().await?))
    }

    /// Filters, then pages. A sort on the page request replaces the filter's
    /// own order; the filter's limit does not apply to pages.
    pub async fn select_page(&self, filter: &Filter, request: &PageRequest) -> Result<Page<Record>, RepositoryError> {
        FilterOrder::validate(request.sort(), &self.schema)?;
        let mut records: Vec<Record> = self
            .find_all()
            .await?
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect();
        let sort = if request.sort().is_empty() { filter.sort_spec() } else { request.sort() };
        FilterOrder::sort(&mut records, sort, &self.schema);
        Ok(pager::paginate(records, request))
    }

    fn finder_filter(&self, finder: &Finder, args: Vec<Value>) -> Result<Filter, RepositoryError> {
        let predicate = finder.bind(args)?;
        let mut filter = Filter::new(self.schema.clone());
        filter.predicate(predicate)?.sort(finder.order().clone())?;
        if let Some(limit) = finder.max_results() {
            filter.limit(limit);
        }
        Ok(filter)
    }

    /// Records matching a finder, in the finder's order (insertion order when
    /// it declares none), truncated to its limit.
    pub async fn find_by(&self, finder: &Finder, args: Vec<Value>) -> Result<Vec<Record>, RepositoryError> {
        let filter = self.finder_filter(finder, args)?;
        self.select(&filter).await
    }

    pub async fn find_page_by(
        &self,
        finder: &Finder,
        args: Vec<Value>,
        request: &PageRequest,
    ) -> Result<Page<Record>, RepositoryError> {
        let filter = self.finder_filter(finder, args)?;
        self.select_page(&filter, request).await
    }

    pub async fn count_by(&self, finder: &Finder, args: Vec<Value>) -> Result<usize, RepositoryError> {
        Ok(self.find_by(finder, args).await?.len())
    }

    pub async fn exists_by(&self, finder: &Finder, args: Vec<Value>) -> Result<bool, RepositoryError> {
        Ok(self.count_by(finder, args).await? > 0)
    }

    /// Dispatches on the finder's verb: `find…`, `count…` or `exists…`.
    pub async fn execute(&self, finder: &Finder, args: Vec<Value>) -> Result<FinderResult, RepositoryError> {
        Ok(match finder.finder_kind() {
            FinderKind::Find => FinderResult::Records(self.find_by(finder, args).await?),
            FinderKind::Count => FinderResult::Count(self.count_by(finder, args).await?),
            FinderKind::Exists => FinderResult::Exists(self.exists_by(finder, args).await?),
        })
    }

    /// Full replace of an existing record; an unknown identity is NotFound.
    pub async fn replace(&self, id: RecordId, record: Record) -> Result<Record, RepositoryError> {
        self.store.write().await.replace(&self.collection, id, record)
    }

    pub async fn update_fields(&self, id: RecordId, changes: Map<String, Value>) -> Result<Record, RepositoryError> {
        self.store.write().await.update_fields(&self.collection, id, changes)
    }

    /// Removes one record; an unknown identity is NotFound.
    pub async fn delete_by_id(&self, id: RecordId) -> Result<Record, RepositoryError> {
        self.store.write().await.delete_by_id(&self.collection, id)
    }

    /// Removes every record, returning how many were removed.
    pub async fn delete_all(&self) -> Result<usize, RepositoryError> {
        self.store.write().await.delete_all(&self.collection)
    }

    pub async fn exists_by_id(&self, id: RecordId) -> Result<bool, RepositoryError> {
        self.store.read().await.exists(&self.collection, id)
    }

    pub async fn count(&self) -> Result<usize, RepositoryError> {
        self.store.read().await.count(&self.collection)
    }
}
