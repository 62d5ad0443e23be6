// used for the dynamic values flowing through entities
use serde_json::{Map, Value};

// used to print out entities as JSON
use std::fmt;

use crate::Attributes;
use crate::column::Attribute;
use crate::columns::Columns;
use crate::locale::LocaleContext;

// ------------- Entity -------------
/// The read form of a stored item: attributes in the order storage handed
/// them out, each one read through its column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    attributes: Vec<(String, Attribute)>,
}

impl Entity {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }
    /// Sets an attribute, keeping the position of an existing one.
    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) {
        let name = name.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = attribute,
            None => self.attributes.push((name, attribute)),
        }
    }
    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, attribute)| attribute)
    }
    /// The plain value of an attribute, `None` for translations and instants.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Attribute::as_value)
    }
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes
            .iter()
            .map(|(name, attribute)| (name.as_str(), attribute))
    }
    pub fn len(&self) -> usize {
        self.attributes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(name, attribute)| (name.clone(), attribute.to_value()))
                .collect::<Map<String, Value>>(),
        )
    }
}
impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

// ------------- Entities -------------
/// Entities keyed the way storage keyed their items: by the index column
/// when one was requested, by position otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Entities<E> {
    entities: Vec<(String, E)>,
}

impl<E> Entities<E> {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
        }
    }
    pub fn push(&mut self, key: impl Into<String>, entity: E) {
        self.entities.push((key.into(), entity));
    }
    pub fn first(&self) -> Option<&E> {
        self.entities.first().map(|(_, entity)| entity)
    }
    pub fn get(&self, key: &str) -> Option<&E> {
        self.entities
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, entity)| entity)
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|(key, _)| key.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> {
        self.entities.iter().map(|(key, entity)| (key.as_str(), entity))
    }
    pub fn len(&self) -> usize {
        self.entities.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
impl<E> Default for Entities<E> {
    fn default() -> Self {
        Self::new()
    }
}
impl<E> IntoIterator for Entities<E> {
    type Item = (String, E);
    type IntoIter = std::vec::IntoIter<(String, E)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

// ------------- Factories -------------
/// Turns raw stored attributes into domain objects.
pub trait EntityFactory: Send + Sync {
    type Entity;
    fn create_entity(
        &self,
        attributes: Attributes,
        columns: &Columns,
        locales: &LocaleContext,
    ) -> Self::Entity;
}

/// Reads attributes through the columns into an [`Entity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEntityFactory;

impl EntityFactory for DefaultEntityFactory {
    type Entity = Entity;
    fn create_entity(
        &self,
        attributes: Attributes,
        columns: &Columns,
        locales: &LocaleContext,
    ) -> Entity {
        columns.process_reading(attributes, locales)
    }
}
