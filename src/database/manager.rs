use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::database::dynamic::DynamicRepository;
use crate::database::entity::Entity;
use crate::database::error::RepositoryError;
use crate::database::models::{Author, Book, Student, User};
use crate::database::repository::Repository;
use crate::database::schema::Schema;
use crate::database::store::MemoryStore;
use crate::filter::error::FilterError;
use crate::filter::finder::Finder;

type FinderTable = Arc<BTreeMap<String, Finder>>;

/// Registry of collections and their declared finders over one store.
///
/// Finders are parsed and checked against the schema when the collection is
/// registered, so a bad declaration fails at startup rather than on first call.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    store: MemoryStore,
    finders: Arc<RwLock<HashMap<String, FinderTable>>>,
}

impl Catalog {
    pub fn new(store: MemoryStore) -> Self {
        Self { store, finders: Arc::default() }
    }

    /// Catalog over a fresh store with every built-in model registered.
    pub async fn with_defaults() -> Result<Self, RepositoryError> {
        let catalog = Self::new(MemoryStore::new());
        catalog.register::<Book>().await?;
        catalog.register::<Author>().await?;
        catalog.register::<Student>().await?;
        catalog.register::<User>().await?;
        Ok(catalog)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub async fn register<T: Entity>(&self) -> Result<(), RepositoryError> {
        let schema = T::schema();
        let finders = T::finders(&schema)?;
        self.register_schema(schema, finders).await
    }

    /// Registers a collection with its finders. Two finders with the same
    /// name are rejected.
    pub async fn register_schema(&self, schema: Schema, finders: Vec<Finder>) -> Result<(), RepositoryError> {
        let mut table = BTreeMap::new();
        for finder in finders {
            finder.validate(&schema)?;
            let name = finder.name();
            if table.insert(name.clone(), finder).is_some() {
                return Err(FilterError::InvalidFinder(format!("{} declared twice on {}", name, schema.name())).into());
            }
        }

        let name = schema.name().to_string();
        let count = table.len();
        self.store.register(schema).await;
        self.finders.write().await.insert(name.clone(), Arc::new(table));
        info!("Registered {} finder(s) for {}", count, name);
        Ok(())
    }

    pub async fn collections(&self) -> Vec<String> {
        self.store.collection_names().await
    }

    pub async fn schema(&self, collection: &str) -> Result<Arc<Schema>, RepositoryError> {
        self.store.schema(collection).await
    }

    async fn finder_table(&self, collection: &str) -> Result<FinderTable, RepositoryError> {
        self.finders
            .read()
            .await
            .get(collection)
            .cloned()
            .ok_or_else(|| RepositoryError::UnknownCollection(collection.to_string()))
    }

    pub async fn finder(&self, collection: &str, name: &str) -> Result<Finder, RepositoryError> {
        self.finder_table(collection).await?.get(name).cloned().ok_or_else(|| {
            FilterError::UnknownFinder { collection: collection.to_string(), finder: name.to_string() }.into()
        })
    }

    pub async fn finders(&self, collection: &str) -> Result<Vec<Finder>, RepositoryError> {
        Ok(self.finder_table(collection).await?.values().cloned().collect())
    }

    pub async fn dynamic(&self, collection: &str) -> Result<DynamicRepository, RepositoryError> {
        DynamicRepository::open(self.store.clone(), collection).await
    }

    pub async fn repository<T: Entity>(&self) -> Result<Repository<T>, RepositoryError> {
        let inner = self.dynamic(T::COLLECTION).await?;
        let finders = self.finder_table(T::COLLECTION).await?;
        Ok(Repository::new(inner, finders))
    }
}
