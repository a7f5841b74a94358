use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::database::dynamic::DynamicRepository;
use crate::database::entity::Entity;
use crate::database::error::RepositoryError;
use crate::database::record::RecordId;
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;
use crate::filter::{Filter, SortSpec};
use crate::pager::{Page, PageRequest};

/// Typed repository over the collection of `T`.
pub struct Repository<T> {
    inner: DynamicRepository,
    finders: Arc<BTreeMap<String, Finder>>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            finders: self.finders.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(inner: DynamicRepository, finders: Arc<BTreeMap<String, Finder>>) -> Self {
        Self { inner, finders, _phantom: std::marker::PhantomData }
    }

    pub fn dynamic(&self) -> &DynamicRepository {
        &self.inner
    }

    /// Looks up a finder declared for `T`.
    pub fn finder(&self, name: &str) -> Result<&Finder, RepositoryError> {
        self.finders.get(name).ok_or_else(|| {
            RepositoryError::Filter(FilterError::UnknownFinder {
                collection: T::COLLECTION.to_string(),
                finder: name.to_string(),
            })
        })
    }

    fn decode(records: Vec<crate::database::record::Record>) -> Result<Vec<T>, RepositoryError> {
        records.into_iter().map(T::from_record).collect()
    }

    pub async fn save(&self, entity: &T) -> Result<T, RepositoryError> {
        T::from_record(self.inner.save(entity.to_record()?).await?)
    }

    pub async fn save_all(&self, entities: &[T]) -> Result<Vec<T>, RepositoryError> {
        let records = entities.iter().map(T::to_record).collect::<Result<Vec<_>, _>>()?;
        Self::decode(self.inner.save_all(records).await?)
    }

    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<T>, RepositoryError> {
        self.inner.find_by_id(id).await?.map(T::from_record).transpose()
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<T, RepositoryError> {
        T::from_record(self.inner.get_by_id(id).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<T>, RepositoryError> {
        Self::decode(self.inner.find_all().await?)
    }

    pub async fn find_all_sorted(&self, sort: &SortSpec) -> Result<Vec<T>, RepositoryError> {
        Self::decode(self.inner.find_all_sorted(sort).await?)
    }

    pub async fn find_page(&self, request: &PageRequest) -> Result<Page<T>, RepositoryError> {
        self.inner.find_page(request).await?.try_map(T::from_record)
    }

    pub async fn select(&self, filter: &Filter) -> Result<Vec<T>, RepositoryError> {
        Self::decode(self.inner.select(filter).await?)
    }

    pub async fn find_by(&self, finder: &Finder, args: Vec<Value>) -> Result<Vec<T>, RepositoryError> {
        Self::decode(self.inner.find_by(finder, args).await?)
    }

    /// Runs a declared finder by name.
    pub async fn find_named(&self, name: &str, args: Vec<Value>) -> Result<Vec<T>, RepositoryError> {
        self.find_by(self.finder(name)?, args).await
    }

    pub async fn find_page_named(
        &self,
        name: &str,
        args: Vec<Value>,
        request: &PageRequest,
    ) -> Result<Page<T>, RepositoryError> {
        self.inner
            .find_page_by(self.finder(name)?, args, request)
            .await?
            .try_map(T::from_record)
    }

    pub async fn count_named(&self, name: &str, args: Vec<Value>) -> Result<usize, RepositoryError> {
        self.inner.count_by(self.finder(name)?, args).await
    }

    pub async fn exists_named(&self, name: &str, args: Vec<Value>) -> Result<bool, RepositoryError> {
        self.inner.exists_by(self.finder(name)?, args).await
    }

    pub async fn replace(&self, id: RecordId, entity: &T) -> Result<T, RepositoryError> {
        T::from_record(self.inner.replace(id, entity.to_record()?).await?)
    }

    pub async fn update_fields(&self, id: RecordId, changes: Map<String, Value>) -> Result<T, RepositoryError> {
        T::from_record(self.inner.update_fields(id, changes).await?)
    }

    pub async fn delete_by_id(&self, id: RecordId) -> Result<T, RepositoryError> {
        T::from_record(self.inner.delete_by_id(id).await?)
    }

    pub async fn delete_all(&self) -> Result<usize, RepositoryError> {
        self.inner.delete_all().await
    }

    pub async fn exists_by_id(&self, id: RecordId) -> Result<bool, RepositoryError> {
        self.inner.exists_by_id(id).await
    }

    pub async fn count(&self) -> Result<usize, RepositoryError> {
        self.inner.count().await
    }
}
