use serde_json::{Map, Value};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::error::RepositoryError;
use crate::database::record::{Record, RecordId};
use crate::database::schema::Schema;
use crate::types::Operation;

/// Rows of one collection, kept in insertion order.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: Arc<Schema>,
    rows: HashMap<RecordId, Map<String, Value>>,
    order: Vec<RecordId>,
    next_id: RecordId,
}

impl Collection {
    fn new(schema: Arc<Schema>) -> Self {
        Self { schema, rows: HashMap::new(), order: Vec::new(), next_id: 1 }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn get(&self, id: RecordId) -> Option<Record> {
        self.rows.get(&id).map(|fields| Record::from_parts(id, fields.clone()))
    }

    fn records(&self) -> Vec<Record> {
        self.order.iter().filter_map(|id| self.get(*id)).collect()
    }

    /// Unique fields must not repeat a value held by another record.
    fn check_unique(&self, record: &Record) -> Result<(), RepositoryError> {
        for def in self.schema.unique_fields() {
            let value = record.field_value(&def.name);
            if value.is_null() {
                continue;
            }
            let clash = self
                .rows
                .iter()
                .any(|(id, fields)| Some(*id) != record.id() && fields.get(&def.name) == Some(&*value));
            if clash {
                return Err(RepositoryError::DuplicateKey {
                    collection: self.schema.name().to_string(),
                    field: def.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn upsert(&mut self, mut record: Record) -> Result<(Record, Operation), RepositoryError> {
        self.schema.validate(&record)?;
        self.check_unique(&record)?;

        let (id, operation) = match record.id() {
            Some(id) if self.rows.contains_key(&id) => (id, Operation::Update),
            Some(id) => {
                let after = self.id_after(id)?;
                self.order.push(id);
                self.next_id = self.next_id.max(after);
                (id, Operation::Create)
            }
            None => {
                let id = self.next_id;
                self.next_id = self.id_after(id)?;
                self.order.push(id);
                (id, Operation::Create)
            }
        };

        record.set_id(Some(id));
        self.rows.insert(id, record.fields().clone());
        Ok((record, operation))
    }

    /// The sequence value following `id`. `RecordId::MAX` is never stored, so
    /// the sequence cannot hand out an identity twice.
    fn id_after(&self, id: RecordId) -> Result<RecordId, RepositoryError> {
        id.checked_add(1).ok_or_else(|| {
            RepositoryError::InvalidArgument(format!(
                "id {} exhausts the id sequence of {}",
                id,
                self.schema.name()
            ))
        })
    }

    fn remove(&mut self, id: RecordId) -> Option<Record> {
        let fields = self.rows.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(Record::from_parts(id, fields))
    }

    fn clear(&mut self) -> usize {
        let removed = self.order.len();
        self.rows.clear();
        self.order.clear();
        removed
    }
}

/// All collections. Every method is synchronous and runs under whichever
/// lock the caller holds.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    collections: HashMap<String, Collection>,
}

impl StoreState {
    /// Registers a collection, or swaps the schema of an existing one while
    /// keeping its rows.
    pub fn register(&mut self, schema: Schema) -> Arc<Schema> {
        let schema = Arc::new(schema);
        match self.collections.get_mut(schema.name()) {
            Some(existing) => existing.schema = schema.clone(),
            None => {
                self.collections.insert(schema.name().to_string(), Collection::new(schema.clone()));
            }
        }
        schema
    }

    pub fn collection(&self, name: &str) -> Result<&Collection, RepositoryError> {
        self.collections
            .get(name)
            .ok_or_else(|| RepositoryError::UnknownCollection(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> Result<&mut Collection, RepositoryError> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| RepositoryError::UnknownCollection(name.to_string()))
    }

    pub fn schema(&self, name: &str) -> Result<Arc<Schema>, RepositoryError> {
        Ok(self.collection(name)?.schema.clone())
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.keys().cloned().collect();
        names.sort();
        names
    }

    /// Inserts when the record has no identity or an identity not yet
    /// stored, otherwise replaces the stored fields.
    pub fn save(&mut self, name: &str, record: Record) -> Result<Record, RepositoryError> {
        let (saved, operation) = self.collection_mut(name)?.upsert(record)?;
        info!("{} {} id={}", operation, name, saved.id().unwrap_or_default());
        Ok(saved)
    }

    /// Full replace of a stored record. Unlike [`save`](Self::save) an
    /// absent identity is NotFound, never an insert.
    pub fn replace(&mut self, name: &str, id: RecordId, mut record: Record) -> Result<Record, RepositoryError> {
        let collection = self.collection_mut(name)?;
        if !collection.rows.contains_key(&id) {
            return Err(RepositoryError::not_found(name, id));
        }
        record.set_id(Some(id));
        let (saved, _) = collection.upsert(record)?;
        info!("{} {} id={} (replace)", Operation::Update, name, id);
        Ok(saved)
    }

    /// Partial update: merges `changes` into the stored record and revalidates.
    pub fn update_fields(
        &mut self,
        name: &str,
        id: RecordId,
        changes: Map<String, Value>,
    ) -> Result<Record, RepositoryError> {
        let collection = self.collection_mut(name)?;
        let mut record = collection.get(id).ok_or_else(|| RepositoryError::not_found(name, id))?;
        record.merge(changes);
        let (saved, _) = collection.upsert(record)?;
        info!("{} {} id={} (partial)", Operation::Update, name, id);
        Ok(saved)
    }

    pub fn find_by_id(&self, name: &str, id: RecordId) -> Result<Option<Record>, RepositoryError> {
        debug!("{} {} id={}", Operation::Select, name, id);
        Ok(self.collection(name)?.get(id))
    }

    /// All records in insertion order.
    pub fn scan(&self, name: &str) -> Result<Vec<Record>, RepositoryError> {
        let collection = self.collection(name)?;
        debug!("{} {} scan ({} rows)", Operation::Select, name, collection.len());
        Ok(collection.records())
    }

    pub fn delete_by_id(&mut self, name: &str, id: RecordId) -> Result<Record, RepositoryError> {
        let removed = self
            .collection_mut(name)?
            .remove(id)
            .ok_or_else(|| RepositoryError::not_found(name, id))?;
        info!("{} {} id={}", Operation::Delete, name, id);
        Ok(removed)
    }

    pub fn delete_all(&mut self, name: &str) -> Result<usize, RepositoryError> {
        let removed = self.collection_mut(name)?.clear();
        info!("{} {} all ({} rows)", Operation::Delete, name, removed);
        Ok(removed)
    }

    pub fn exists(&self, name: &str, id: RecordId) -> Result<bool, RepositoryError> {
        Ok(self.collection(name)?.rows.contains_key(&id))
    }

    pub fn count(&self, name: &str) -> Result<usize, RepositoryError> {
        Ok(self.collection(name)?.len())
    }
}

/// Shared in-memory store. Single calls take the lock once, so each save or
/// delete is atomic; multi-step work goes through [`Transaction`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, schema: Schema) -> Arc<Schema> {
        let name = schema.name().to_string();
        let schema = self.state.write().await.register(schema);
        info!("Registered collection: {}", name);
        schema
    }

    pub async fn schema(&self, name: &str) -> Result<Arc<Schema>, RepositoryError> {
        self.state.read().await.schema(name)
    }

    pub async fn collection_names(&self) -> Vec<String> {
        self.state.read().await.collection_names()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().await
    }

    /// Takes the store exclusively until the transaction is committed or dropped.
    pub async fn begin(&self) -> Transaction {
        let guard = self.state.clone().write_owned().await;
        let snapshot = (*guard).clone();
        let id = Uuid::new_v4();
        debug!("Transaction {} started", id);
        Transaction { guard, snapshot: Some(snapshot), id }
    }
}

/// Exclusive scope over the store. Dropping it without [`Transaction::commit`]
/// restores the state captured by [`MemoryStore::begin`].
pub struct Transaction {
    guard: OwnedRwLockWriteGuard<StoreState>,
    snapshot: Option<StoreState>,
    id: Uuid,
}

impl Transaction {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn commit(mut self) {
        self.snapshot = None;
        info!("Transaction {} committed", self.id);
    }

    pub fn rollback(self) {
        // Drop restores the snapshot
    }
}

impl Deref for Transaction {
    type Target = StoreState;

    fn deref(&self) -> &StoreState {
        &self.guard
    }
}

impl DerefMut for Transaction {
    fn deref_mut(&mut self) -> &mut StoreState {
        &mut self.guard
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
            warn!("Transaction {} rolled back", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::FieldDef;
    use serde_json::json;

    fn users() -> Schema {
        Schema::new("users")
            .field(FieldDef::text("user_name").required().unique())
            .field(FieldDef::integer("age"))
    }

    fn user(name: &str) -> Record {
        Record::from_json(json!({ "user_name": name })).unwrap()
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.register(users()).await;
        store
    }

    #[tokio::test]
    async fn assigns_sequential_ids_and_keeps_insertion_order() {
        let store = store().await;
        let mut state = store.write().await;
        let a = state.save("users", user("ann")).unwrap();
        let b = state.save("users", user("bob")).unwrap();
        assert_eq!((a.id(), b.id()), (Some(1), Some(2)));

        let explicit = state.save("users", user("cid").set_id(Some(10)).clone()).unwrap();
        assert_eq!(explicit.id(), Some(10));
        let next = state.save("users", user("dan")).unwrap();
        assert_eq!(next.id(), Some(11));

        let names: Vec<_> = state.scan("users").unwrap().iter().map(|r| r.get("user_name").cloned()).collect();
        assert_eq!(names, vec![Some(json!("ann")), Some(json!("bob")), Some(json!("cid")), Some(json!("dan"))]);
    }

    #[tokio::test]
    async fn saving_an_existing_identity_replaces() {
        let store = store().await;
        let mut state = store.write().await;
        let saved = state.save("users", user("ann")).unwrap();
        state.save("users", saved.clone()).unwrap();
        assert_eq!(state.count("users").unwrap(), 1);

        let mut renamed = saved.clone();
        renamed.set("user_name", "anna");
        state.save("users", renamed).unwrap();
        let stored = state.find_by_id("users", saved.id().unwrap()).unwrap().unwrap();
        assert_eq!(stored.get("user_name"), Some(&json!("anna")));
    }

    #[tokio::test]
    async fn unique_fields_reject_duplicates() {
        let store = store().await;
        let mut state = store.write().await;
        state.save("users", user("ann")).unwrap();
        let err = state.save("users", user("ann")).unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateKey { ref field, .. } if field == "user_name"));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = store().await;
        let mut state = store.write().await;
        assert!(matches!(state.delete_by_id("users", 42), Err(RepositoryError::NotFound { id: 42, .. })));
        assert!(matches!(state.scan("nope"), Err(RepositoryError::UnknownCollection(_))));
    }

    #[tokio::test]
    async fn update_fields_merges_and_validates() {
        let store = store().await;
        let mut state = store.write().await;
        let saved = state.save("users", user("ann")).unwrap();
        let id = saved.id().unwrap();

        let mut changes = Map::new();
        changes.insert("age".into(), json!(30));
        let updated = state.update_fields("users", id, changes).unwrap();
        assert_eq!(updated.get("user_name"), Some(&json!("ann")));
        assert_eq!(updated.get("age"), Some(&json!(30)));

        let mut bad = Map::new();
        bad.insert("age".into(), json!("old"));
        assert!(matches!(state.update_fields("users", id, bad), Err(RepositoryError::Validation { .. })));
        assert!(matches!(state.update_fields("users", 99, Map::new()), Err(RepositoryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn id_sequence_never_repeats_at_the_top_of_the_range() {
        let store = store().await;
        let mut state = store.write().await;

        let err = state.save("users", user("max").set_id(Some(RecordId::MAX)).clone()).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidArgument(_)));
        assert_eq!(state.count("users").unwrap(), 0);

        let last = state.save("users", user("last").set_id(Some(RecordId::MAX - 1)).clone()).unwrap();
        assert_eq!(last.id(), Some(RecordId::MAX - 1));
        let err = state.save("users", user("next")).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidArgument(_)));

        let rows = state.scan("users").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("user_name"), Some(&json!("last")));
    }

    #[tokio::test]
    async fn replace_never_inserts() {
        let store = store().await;
        let mut state = store.write().await;
        let saved = state.save("users", user("ann")).unwrap();
        let id = saved.id().unwrap();

        let replaced = state.replace("users", id, user("anna")).unwrap();
        assert_eq!(replaced.id(), Some(id));
        assert_eq!(replaced.get("user_name"), Some(&json!("anna")));

        state.delete_by_id("users", id).unwrap();
        let err = state.replace("users", id, user("ghost")).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(state.count("users").unwrap(), 0);
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = store().await;
        {
            let mut tx = store.begin().await;
            tx.save("users", user("ann")).unwrap();
            tx.save("users", user("bob")).unwrap();
        }
        assert_eq!(store.read().await.count("users").unwrap(), 0);

        let mut tx = store.begin().await;
        tx.save("users", user("ann")).unwrap();
        tx.commit();
        assert_eq!(store.read().await.count("users").unwrap(), 1);

        let mut tx = store.begin().await;
        tx.delete_all("users").unwrap();
        tx.rollback();
        assert_eq!(store.read().await.count("users").unwrap(), 1);
    }
}
