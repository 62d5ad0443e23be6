// used for the dynamic values flowing through columns
use serde_json::{Map, Value};

// used to share column descriptors between derived views
use std::sync::Arc;

use crate::Attributes;
use crate::column::Column;
use crate::entity::Entity;
use crate::locale::LocaleContext;

/// Ordered set of columns, unique by name.
///
/// Adding a column with a name already present replaces the earlier one in
/// place. Every view (`storable`, `only`, ...) returns a new set and leaves
/// this one as it is.
#[derive(Debug, Clone, Default)]
pub struct Columns {
    columns: Vec<Arc<dyn Column>>,
}

impl Columns {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }
    pub fn with<C: Column + 'static>(mut self, column: C) -> Self {
        self.push(Arc::new(column));
        self
    }
    pub fn push(&mut self, column: Arc<dyn Column>) {
        match self.position(column.name()) {
            Some(index) => self.columns[index] = column,
            None => self.columns.push(column),
        }
    }
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&dyn Column) -> bool,
    {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|column| predicate(column.as_ref()))
                .cloned()
                .collect(),
        }
    }
    pub fn storable(&self, storable: bool) -> Self {
        self.filter(|column| column.is_storable() == storable)
    }
    pub fn translatable(&self, translatable: bool) -> Self {
        self.filter(|column| column.is_translatable() == translatable)
    }
    pub fn only(&self, names: &[&str]) -> Self {
        self.filter(|column| names.iter().any(|name| *name == column.name()))
    }
    pub fn except(&self, names: &[&str]) -> Self {
        self.filter(|column| !names.iter().any(|name| *name == column.name()))
    }
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Column>> {
        self.columns.iter().find(|column| column.name() == name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
    pub fn all(&self) -> &[Arc<dyn Column>] {
        &self.columns
    }
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Column>> {
        self.columns.iter()
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    pub fn names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name().to_owned())
            .collect()
    }
    /// The first column declared with a primary type.
    pub fn primary(&self) -> Option<&Arc<dyn Column>> {
        self.columns
            .iter()
            .find(|column| column.column_type().is_primary())
    }
    /// Projects one described property across all columns, skipping columns
    /// that do not have it.
    pub fn column(&self, property: &str) -> Vec<Value> {
        self.columns
            .iter()
            .filter_map(|column| column.describe().property(property))
            .collect()
    }
    /// Like [`Columns::column`], keyed by another property. Later columns win
    /// on equal keys.
    pub fn column_indexed(&self, property: &str, index: &str) -> Map<String, Value> {
        let mut projected = Map::new();
        for column in &self.columns {
            let description = column.describe();
            if let (Some(value), Some(key)) =
                (description.property(property), description.property(index))
            {
                let key = match key {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                projected.insert(key, value);
            }
        }
        projected
    }
    /// Reads the known attributes through their columns. Unknown attributes
    /// pass through as they are and the order of the input is kept. A hook
    /// sees the attributes already read in their flattened form, later ones
    /// as they came from storage.
    pub fn process_reading(&self, attributes: Attributes, locales: &LocaleContext) -> Entity {
        let mut current = attributes.clone();
        let mut entity = Entity::new();
        for (name, value) in attributes {
            let attribute = match self.get(&name) {
                Some(column) => {
                    let attribute = column.reading(value, &current, locales);
                    current.insert(name.clone(), attribute.to_value());
                    attribute
                }
                None => value.into(),
            };
            entity.insert(name, attribute);
        }
        entity
    }
    /// Writes the known attributes through their columns, then appends the
    /// `default` of every column missing from the attributes. A hook sees
    /// the attributes already written, later ones as given.
    pub fn process_writing(&self, attributes: Attributes, locales: &LocaleContext) -> Attributes {
        let mut written = attributes;
        let names: Vec<String> = written.keys().cloned().collect();
        for name in names {
            if let Some(column) = self.get(&name) {
                let value = written.get(&name).cloned().unwrap_or(Value::Null);
                let value = column.writing(value, &written, locales);
                written.insert(name, value);
            }
        }
        for column in &self.columns {
            let column_type = column.column_type();
            if written.contains_key(column.name()) || !column_type.has("default") {
                continue;
            }
            let default = column_type.get("default").cloned().unwrap_or(Value::Null);
            written.insert(column.name().to_owned(), default);
        }
        written
    }
}

impl<'a> IntoIterator for &'a Columns {
    type Item = &'a Arc<dyn Column>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn Column>>;
    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

impl FromIterator<Arc<dyn Column>> for Columns {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Column>>>(iter: I) -> Self {
        let mut columns = Columns::new();
        for column in iter {
            columns.push(column);
        }
        columns
    }
}
