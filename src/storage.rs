//! The contract between repositories and whatever keeps their items.
//!
//! A [`Query`] is a plain value recording clauses, orderings, a limit and an
//! index column for one table. A [`Storage`] executes queries. Comparison
//! operators are forwarded verbatim, it is up to the storage to accept or
//! reject them.

// used for the dynamic values flowing between repositories and storage
use serde_json::Value;

// used for the table registry
use seahash::SeaHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::{Mutex, PoisonError};

// used to print out readable forms of write methods
use std::fmt;

use crate::Attributes;
use crate::error::Result;

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Clauses -------------
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Compare {
        column: String,
        operator: String,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
        negated: bool,
    },
    Between {
        column: String,
        bounds: Vec<Value>,
        negated: bool,
    },
    Null {
        column: String,
        negated: bool,
    },
    JsonContains {
        column: String,
        value: Value,
    },
    JsonContainsKey {
        column: String,
    },
}

impl Clause {
    pub fn column(&self) -> &str {
        match self {
            Clause::Compare { column, .. }
            | Clause::In { column, .. }
            | Clause::Between { column, .. }
            | Clause::Null { column, .. }
            | Clause::JsonContains { column, .. }
            | Clause::JsonContainsKey { column } => column,
        }
    }
}

// a single value is a set of one, null is the empty set
fn values_of(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(list) => list,
        Value::Object(map) => map.into_iter().map(|(_, value)| value).collect(),
        other => vec![other],
    }
}

// ------------- Query -------------
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    table: String,
    clauses: Vec<Clause>,
    orders: Vec<(String, String)>,
    limit: Option<(Option<usize>, usize)>,
    index: Option<String>,
}

impl Query {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
    pub fn orders(&self) -> &[(String, String)] {
        &self.orders
    }
    /// The row cap (`None` for no cap) and offset, if a limit was set.
    pub fn limit_window(&self) -> Option<(Option<usize>, usize)> {
        self.limit
    }
    pub fn index_column(&self) -> Option<&str> {
        self.index.as_deref()
    }
    pub fn where_(mut self, column: &str, operator: &str, value: Value) -> Self {
        self.clauses.push(Clause::Compare {
            column: column.to_owned(),
            operator: operator.to_owned(),
            value,
        });
        self
    }
    pub fn where_in(mut self, column: &str, values: Value) -> Self {
        self.clauses.push(Clause::In {
            column: column.to_owned(),
            values: values_of(values),
            negated: false,
        });
        self
    }
    pub fn where_not_in(mut self, column: &str, values: Value) -> Self {
        self.clauses.push(Clause::In {
            column: column.to_owned(),
            values: values_of(values),
            negated: true,
        });
        self
    }
    pub fn where_between(mut self, column: &str, bounds: Vec<Value>) -> Self {
        self.clauses.push(Clause::Between {
            column: column.to_owned(),
            bounds,
            negated: false,
        });
        self
    }
    pub fn where_not_between(mut self, column: &str, bounds: Vec<Value>) -> Self {
        self.clauses.push(Clause::Between {
            column: column.to_owned(),
            bounds,
            negated: true,
        });
        self
    }
    pub fn where_null(mut self, column: &str) -> Self {
        self.clauses.push(Clause::Null {
            column: column.to_owned(),
            negated: false,
        });
        self
    }
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.clauses.push(Clause::Null {
            column: column.to_owned(),
            negated: true,
        });
        self
    }
    pub fn where_json_contains(mut self, column: &str, value: Value) -> Self {
        self.clauses.push(Clause::JsonContains {
            column: column.to_owned(),
            value,
        });
        self
    }
    pub fn where_json_contains_key(mut self, column: &str) -> Self {
        self.clauses.push(Clause::JsonContainsKey {
            column: column.to_owned(),
        });
        self
    }
    pub fn order(mut self, column: &str, direction: &str) -> Self {
        self.orders.push((column.to_owned(), direction.to_owned()));
        self
    }
    pub fn limit(mut self, count: Option<usize>, offset: usize) -> Self {
        self.limit = Some((count, offset));
        self
    }
    /// Keys the returned items by the value of this column.
    pub fn index(mut self, column: &str) -> Self {
        self.index = Some(column.to_owned());
        self
    }
}

// ------------- Items -------------
/// Keyed collection of stored items, in the order storage returned them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Items {
    items: Vec<(String, Attributes)>,
}

impl Items {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }
    pub fn push(&mut self, key: impl Into<String>, item: Attributes) {
        self.items.push((key.into(), item));
    }
    pub fn first(&self) -> Option<&Attributes> {
        self.items.first().map(|(_, item)| item)
    }
    pub fn get(&self, key: &str) -> Option<&Attributes> {
        self.items
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, item)| item)
    }
    pub fn all(&self) -> &[(String, Attributes)] {
        &self.items
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Attributes)> {
        self.items.iter().map(|(key, item)| (key.as_str(), item))
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
impl IntoIterator for Items {
    type Item = (String, Attributes);
    type IntoIter = std::vec::IntoIter<(String, Attributes)>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ------------- Tables -------------
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub primary_key: Option<String>,
}

/// Registry of the tables repositories have announced, with their stored
/// column names and primary key.
#[derive(Debug, Default)]
pub struct Tables {
    tables: Mutex<HashMap<String, Table, OtherHasher>>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }
    /// Registers a table, replacing an earlier registration of the same name.
    pub fn add(&self, name: &str, columns: Vec<String>, primary_key: Option<String>) {
        let table = Table {
            name: name.to_owned(),
            columns,
            primary_key,
        };
        // a poisoned registry is still consistent
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.insert(name.to_owned(), table);
    }
    pub fn get(&self, name: &str) -> Option<Table> {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.get(name).cloned()
    }
    pub fn primary_key(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|table| table.primary_key)
    }
    pub fn columns(&self, name: &str) -> Option<Vec<String>> {
        self.get(name).map(|table| table.columns)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

// ------------- Storage -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMethod {
    Insert,
    Update,
    Delete,
}

impl WriteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMethod::Insert => "insert",
            WriteMethod::Update => "update",
            WriteMethod::Delete => "delete",
        }
    }
}
impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub trait Storage: Send + Sync {
    fn tables(&self) -> &Tables;
    /// Starts a query on a table.
    fn table(&self, name: &str) -> Query {
        Query::new(name)
    }
    /// The first item matching the query whose primary key equals `id`.
    fn find(&self, query: &Query, id: &Value) -> Result<Option<Attributes>>;
    fn first(&self, query: &Query) -> Result<Option<Attributes>>;
    fn get(&self, query: &Query) -> Result<Items>;
    fn count(&self, query: &Query) -> Result<usize>;
    /// Stores a new item and returns it as stored.
    fn insert(&self, query: &Query, attributes: Attributes) -> Result<Attributes>;
    /// Updates all matching items. Returns them as updated if the storage
    /// supports returning items, nothing otherwise.
    fn update(&self, query: &Query, attributes: Attributes) -> Result<Items>;
    /// Deletes all matching items. Returns them if the storage supports
    /// returning items, nothing otherwise.
    fn delete(&self, query: &Query) -> Result<Items>;
    fn supports_returning_items(&self, method: WriteMethod) -> bool;
}
