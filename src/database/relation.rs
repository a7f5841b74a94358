use serde_json::Value;
use std::marker::PhantomData;

use crate::database::entity::Entity;
use crate::database::error::RepositoryError;
use crate::database::record::RecordId;
use crate::database::store::MemoryStore;

/// A child-to-parent link stored as a plain integer field on the child.
///
/// Nothing cascades implicitly. Callers that want the parent and child
/// written or removed together use [`save_cascade`](Self::save_cascade) and
/// [`delete_cascade`](Self::delete_cascade), which run in one transaction.
pub struct ForeignKey<C, P> {
    field: &'static str,
    _marker: PhantomData<fn() -> (C, P)>,
}

impl<C, P> ForeignKey<C, P> {
    pub const fn new(field: &'static str) -> Self {
        Self { field, _marker: PhantomData }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl<C: Entity, P: Entity> ForeignKey<C, P> {
    fn parent_id(&self, child: &C) -> Result<Option<RecordId>, RepositoryError> {
        let record = child.to_record()?;
        match record.get(self.field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                RepositoryError::InvalidArgument(format!("{}.{} is not an id: {}", C::COLLECTION, self.field, value))
            }),
        }
    }

    /// The parent the child points at; None when the link is unset or dangling.
    pub async fn load_parent(&self, store: &MemoryStore, child: &C) -> Result<Option<P>, RepositoryError> {
        let Some(parent_id) = self.parent_id(child)? else {
            return Ok(None);
        };
        store
            .read()
            .await
            .find_by_id(P::COLLECTION, parent_id)?
            .map(P::from_record)
            .transpose()
    }

    pub async fn load_children(&self, store: &MemoryStore, parent_id: RecordId) -> Result<Vec<C>, RepositoryError> {
        let records = store.read().await.scan(C::COLLECTION)?;
        records
            .into_iter()
            .filter(|record| record.get(self.field).and_then(Value::as_i64) == Some(parent_id))
            .map(C::from_record)
            .collect()
    }

    /// Saves the parent, points the child at it and saves the child.
    pub async fn save_cascade(&self, store: &MemoryStore, parent: &P, child: &C) -> Result<(P, C), RepositoryError> {
        let mut tx = store.begin().await;

        let saved_parent = tx.save(P::COLLECTION, parent.to_record()?)?;
        let parent_id = saved_parent
            .id()
            .ok_or_else(|| RepositoryError::InvalidArgument("saved parent has no id".to_string()))?;

        let mut child_record = child.to_record()?;
        child_record.set(self.field, parent_id);
        let saved_child = tx.save(C::COLLECTION, child_record)?;

        let result = (P::from_record(saved_parent)?, C::from_record(saved_child)?);
        tx.commit();
        Ok(result)
    }

    /// Deletes the parent and every child pointing at it. Returns the number
    /// of children removed.
    pub async fn delete_cascade(&self, store: &MemoryStore, parent_id: RecordId) -> Result<usize, RepositoryError> {
        let mut tx = store.begin().await;

        let child_ids: Vec<RecordId> = tx
            .scan(C::COLLECTION)?
            .into_iter()
            .filter(|record| record.get(self.field).and_then(Value::as_i64) == Some(parent_id))
            .filter_map(|record| record.id())
            .collect();
        for id in &child_ids {
            tx.delete_by_id(C::COLLECTION, *id)?;
        }
        tx.delete_by_id(P::COLLECTION, parent_id)?;

        tx.commit();
        Ok(child_ids.len())
    }
}
