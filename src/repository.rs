// used for the dynamic values of ids and query parameters
use serde_json::Value;

// used to share one storage between repositories
use std::sync::Arc;

// used to log repository operations
use tracing::{debug, warn};

use crate::Attributes;
use crate::columns::Columns;
use crate::datatype::to_string;
use crate::entity::{DefaultEntityFactory, Entities, EntityFactory};
use crate::error::{Result, StrataError};
use crate::locale::LocaleContext;
use crate::query::{Limit, apply_limit, apply_order_by, apply_where};
use crate::storage::{Items, Query, Storage, WriteMethod};

/// A repository over one storage table.
///
/// Writes go through [`Columns::process_writing`] before they reach storage
/// and every item coming back is turned into an entity by the factory. The
/// table is announced to the storage on construction with its storable
/// columns and primary key, unless there are no columns at all.
pub struct StorageRepository<S: Storage, F: EntityFactory = DefaultEntityFactory> {
    storage: Arc<S>,
    table: String,
    columns: Columns,
    factory: F,
    locales: LocaleContext,
}

impl<S: Storage> StorageRepository<S, DefaultEntityFactory> {
    pub fn new(storage: Arc<S>, table: impl Into<String>, columns: Columns) -> Self {
        Self::with_factory(storage, table, columns, DefaultEntityFactory)
    }
}

impl<S: Storage, F: EntityFactory> StorageRepository<S, F> {
    pub fn with_factory(
        storage: Arc<S>,
        table: impl Into<String>,
        columns: Columns,
        factory: F,
    ) -> Self {
        let table = table.into();
        if !columns.is_empty() {
            let primary_key = columns.primary().map(|column| column.name().to_owned());
            storage
                .tables()
                .add(&table, columns.storable(true).names(), primary_key);
        }
        Self {
            storage,
            table,
            columns,
            factory,
            locales: LocaleContext::default(),
        }
    }
    pub fn with_locales(mut self, locales: LocaleContext) -> Self {
        self.locales = locales;
        self
    }
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn columns(&self) -> &Columns {
        &self.columns
    }
    pub fn factory(&self) -> &F {
        &self.factory
    }
    pub fn locales(&self) -> &LocaleContext {
        &self.locales
    }
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locales.set_locale(locale);
    }
    pub fn set_locales<I, L>(&mut self, locales: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.locales.set_locales(locales);
    }
    pub fn set_locale_fallbacks<I, K, V>(&mut self, locale_fallbacks: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.locales.set_locale_fallbacks(locale_fallbacks);
    }
    /// The primary key the table was registered with.
    pub fn primary_key(&self) -> Option<String> {
        self.storage.tables().primary_key(&self.table)
    }
    pub fn query(&self) -> Query {
        self.storage.table(&self.table)
    }
    fn filtered(&self, conditions: &Value) -> Query {
        apply_where(self.query(), conditions, &self.columns, &self.locales)
    }
    fn entity(&self, attributes: Attributes) -> F::Entity {
        self.factory
            .create_entity(attributes, &self.columns, &self.locales)
    }
    fn entities(&self, items: Items) -> Entities<F::Entity> {
        let mut entities = Entities::new();
        for (key, item) in items {
            entities.push(key, self.entity(item));
        }
        entities
    }

    // ------------- Reading -------------
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<Option<F::Entity>> {
        let id = id.into();
        debug!(table = %self.table, id = %id, "find by id");
        let item = self.storage.find(&self.query(), &id)?;
        Ok(item.map(|item| self.entity(item)))
    }
    /// Entities keyed by primary key, none if the table has no primary key.
    pub fn find_by_ids<I, V>(&self, ids: I) -> Result<Entities<F::Entity>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let primary_key = match self.primary_key() {
            Some(primary_key) => primary_key,
            None => return Ok(Entities::new()),
        };
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        debug!(table = %self.table, ids = ids.len(), "find by ids");
        let query = self
            .query()
            .where_in(&primary_key, Value::Array(ids))
            .index(&primary_key);
        Ok(self.entities(self.storage.get(&query)?))
    }
    pub fn find_one(&self, conditions: &Value) -> Result<Option<F::Entity>> {
        debug!(table = %self.table, "find one");
        let item = self.storage.first(&self.filtered(conditions))?;
        Ok(item.map(|item| self.entity(item)))
    }
    /// Entities keyed by primary key when the table has one.
    pub fn find_all(
        &self,
        conditions: &Value,
        order_by: &Value,
        limit: Limit,
    ) -> Result<Entities<F::Entity>> {
        let mut query = self.filtered(conditions);
        if let Some(primary_key) = self.primary_key() {
            query = query.index(&primary_key);
        }
        let query = apply_limit(apply_order_by(query, order_by), limit);
        let items = self.storage.get(&query)?;
        debug!(table = %self.table, rows = items.len(), "find all");
        Ok(self.entities(items))
    }
    pub fn count(&self, conditions: &Value) -> Result<usize> {
        let count = self.storage.count(&self.filtered(conditions))?;
        debug!(table = %self.table, count, "count");
        Ok(count)
    }

    // ------------- Writing -------------
    pub fn create(&self, attributes: Attributes) -> Result<F::Entity> {
        let attributes = self.columns.process_writing(attributes, &self.locales);
        let item = self.storage.insert(&self.query(), attributes)?;
        debug!(table = %self.table, "create");
        Ok(self.entity(item))
    }
    pub fn update_by_id(&self, id: impl Into<Value>, attributes: Attributes) -> Result<F::Entity> {
        let id = id.into();
        let primary_key = match self.primary_key() {
            Some(primary_key) => primary_key,
            None => {
                return Err(StrataError::Update {
                    message: String::from("Storage table has no primary key"),
                    id: Some(id),
                    attributes,
                });
            }
        };
        let attributes = self.columns.process_writing(attributes, &self.locales);
        let query = self.query().where_(&primary_key, "=", id.clone());
        let updated = self.storage.update(&query, attributes.clone())?;
        debug!(table = %self.table, id = %id, rows = updated.len(), "update by id");
        match updated.into_iter().next() {
            Some((_, item)) => Ok(self.entity(item)),
            None if self.storage.supports_returning_items(WriteMethod::Update) => {
                Err(StrataError::Update {
                    message: format!("Entity with the id [{}] not found", to_string(&id)),
                    id: Some(id),
                    attributes,
                })
            }
            None => {
                warn!(table = %self.table, id = %id, "storage returned no item, using the id only");
                Ok(self.entity(id_only(primary_key, id)))
            }
        }
    }
    pub fn update(&self, conditions: &Value, attributes: Attributes) -> Result<Entities<F::Entity>> {
        let attributes = self.columns.process_writing(attributes, &self.locales);
        let items = self.storage.update(&self.filtered(conditions), attributes)?;
        debug!(table = %self.table, rows = items.len(), "update");
        Ok(self.entities(items))
    }
    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<F::Entity> {
        let id = id.into();
        let primary_key = match self.primary_key() {
            Some(primary_key) => primary_key,
            None => {
                return Err(StrataError::Delete {
                    message: String::from("Storage table has no primary key"),
                    id: Some(id),
                });
            }
        };
        let query = self.query().where_(&primary_key, "=", id.clone());
        let deleted = self.storage.delete(&query)?;
        debug!(table = %self.table, id = %id, rows = deleted.len(), "delete by id");
        match deleted.into_iter().next() {
            Some((_, item)) => Ok(self.entity(item)),
            None if self.storage.supports_returning_items(WriteMethod::Delete) => {
                Err(StrataError::Delete {
                    message: format!("Entity with the id [{}] not found", to_string(&id)),
                    id: Some(id),
                })
            }
            None => {
                warn!(table = %self.table, id = %id, "storage returned no item, using the id only");
                Ok(self.entity(id_only(primary_key, id)))
            }
        }
    }
    pub fn delete(&self, conditions: &Value) -> Result<Entities<F::Entity>> {
        let items = self.storage.delete(&self.filtered(conditions))?;
        debug!(table = %self.table, rows = items.len(), "delete");
        Ok(self.entities(items))
    }
}

fn id_only(primary_key: String, id: Value) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(primary_key, id);
    attributes
}
