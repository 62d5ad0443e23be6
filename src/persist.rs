//! An in-memory [`Storage`] keeping items per table in insertion order.
//!
//! Registered tables only keep their registered columns and get an
//! auto-incremented primary key when an item comes without one. Column
//! expressions may address paths inside JSON values (`options->color`),
//! string values holding JSON are decoded on the way.

// used for the dynamic values kept as items
use serde_json::Value;

// used for the per table item lists
use std::collections::HashMap;
use std::sync::Mutex;

// used to sort selections
use std::cmp::Ordering;

// used to evaluate like patterns
use regex::RegexBuilder;

// used to log mutations
use tracing::trace;

use crate::Attributes;
use crate::datatype::{is_numeric, to_float, to_int, to_string};
use crate::error::{Result, StrataError};
use crate::query::ColumnPath;
use crate::storage::{Clause, Items, OtherHasher, Query, Storage, Table, Tables, WriteMethod};

#[derive(Debug, Default)]
struct TableData {
    rows: Vec<Attributes>,
    last_id: i64,
}

#[derive(Debug)]
pub struct InMemoryStorage {
    tables: Tables,
    data: Mutex<HashMap<String, TableData, OtherHasher>>,
    returning_items: bool,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: Tables::new(),
            data: Mutex::new(HashMap::default()),
            returning_items: true,
        }
    }
    /// Behaves like a backend without `RETURNING`: updates and deletes hand
    /// back no items.
    pub fn without_returning_items(mut self) -> Self {
        self.returning_items = false;
        self
    }
    /// All items of a table as stored.
    pub fn rows(&self, table: &str) -> Result<Vec<Attributes>> {
        let data = self.data.lock()?;
        Ok(data
            .get(table)
            .map(|table| table.rows.clone())
            .unwrap_or_default())
    }
    fn primary_key(&self, table: &str) -> String {
        self.tables
            .primary_key(table)
            .unwrap_or_else(|| String::from("id"))
    }
}

// only registered columns are kept, unregistered tables keep everything
fn retain(attributes: Attributes, table: Option<&Table>) -> Attributes {
    match table {
        Some(table) => attributes
            .into_iter()
            .filter(|(name, _)| table.columns.iter().any(|column| column == name))
            .collect(),
        None => attributes,
    }
}

// ------------- Evaluation -------------
fn decoded(value: Value) -> Value {
    if let Value::String(s) = &value {
        if let Ok(decoded @ (Value::Object(_) | Value::Array(_))) = serde_json::from_str::<Value>(s) {
            return decoded;
        }
    }
    value
}

fn resolve(row: &Attributes, column: &str) -> Option<Value> {
    let path = ColumnPath::parse(column);
    let mut current = row.get(&path.name)?.clone();
    for segment in path.segments() {
        current = match decoded(current) {
            Value::Object(map) => map.get(segment)?.clone(),
            Value::Array(list) => list.get(segment.parse::<usize>().ok()?)?.clone(),
            _ => return None,
        };
    }
    Some(current)
}

fn numeric_like(value: &Value) -> bool {
    matches!(value, Value::Bool(_)) || is_numeric(value)
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    if numeric_like(left) && numeric_like(right) {
        return to_float(left).partial_cmp(&to_float(right));
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ if left == right => Some(Ordering::Equal),
        _ => None,
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    compare(left, right) == Some(Ordering::Equal)
}

fn like(value: &Value, pattern: &Value) -> Result<bool> {
    if value.is_null() {
        return Ok(false);
    }
    let mut expression = String::from("^");
    for c in to_string(pattern).chars() {
        match c {
            '%' => expression.push_str(".*"),
            '_' => expression.push('.'),
            c => expression.push_str(&regex::escape(&c.to_string())),
        }
    }
    expression.push('$');
    let matcher = RegexBuilder::new(&expression)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| StrataError::Storage(e.to_string()))?;
    Ok(matcher.is_match(&to_string(value)))
}

fn compares(actual: &Value, operator: &str, value: &Value) -> Result<bool> {
    let ordering = compare(actual, value);
    let outcome = match operator.to_lowercase().as_str() {
        "=" => ordering == Some(Ordering::Equal),
        "!=" | "<>" => matches!(ordering, Some(Ordering::Less | Ordering::Greater)),
        ">" => ordering == Some(Ordering::Greater),
        "<" => ordering == Some(Ordering::Less),
        ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        "<=>" => (actual.is_null() && value.is_null()) || ordering == Some(Ordering::Equal),
        "like" => like(actual, value)?,
        "not like" => !actual.is_null() && !like(actual, value)?,
        _ => return Err(StrataError::UnsupportedOperator(operator.to_owned())),
    };
    Ok(outcome)
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (decoded(haystack.clone()), needle) {
        (Value::Array(list), Value::Array(needles)) => needles
            .iter()
            .all(|needle| list.iter().any(|item| equals(item, needle))),
        (Value::Array(list), needle) => list.iter().any(|item| equals(item, needle)),
        (value, needle) => equals(&value, needle),
    }
}

fn matches(row: &Attributes, clause: &Clause) -> Result<bool> {
    let actual = resolve(row, clause.column());
    let value = actual.clone().unwrap_or(Value::Null);
    let outcome = match clause {
        Clause::Compare {
            operator,
            value: expected,
            ..
        } => compares(&value, operator, expected)?,
        Clause::In {
            values, negated, ..
        } => {
            let found = values.iter().any(|candidate| equals(&value, candidate));
            if *negated { !value.is_null() && !found } else { found }
        }
        Clause::Between {
            bounds, negated, ..
        } => match bounds.as_slice() {
            [low, high, ..] => {
                let within = matches!(compare(&value, low), Some(Ordering::Greater | Ordering::Equal))
                    && matches!(compare(&value, high), Some(Ordering::Less | Ordering::Equal));
                if *negated { !value.is_null() && !within } else { within }
            }
            _ => false,
        },
        Clause::Null { negated, .. } => value.is_null() != *negated,
        Clause::JsonContains {
            value: needle, ..
        } => !value.is_null() && contains(&value, needle),
        Clause::JsonContainsKey { .. } => actual.is_some(),
    };
    Ok(outcome)
}

fn ordered(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => {
            compare(left, right).unwrap_or_else(|| to_string(left).cmp(&to_string(right)))
        }
    }
}

/// Positions of the rows selected by the query, ordered and limited.
fn select(rows: &[Attributes], query: &Query) -> Result<Vec<usize>> {
    let mut selected = Vec::new();
    for (position, row) in rows.iter().enumerate() {
        let mut keep = true;
        for clause in query.clauses() {
            if !matches(row, clause)? {
                keep = false;
                break;
            }
        }
        if keep {
            selected.push(position);
        }
    }
    // unknown directions are ignored
    let orders: Vec<(&str, bool)> = query
        .orders()
        .iter()
        .filter_map(|(column, direction)| match direction.to_lowercase().as_str() {
            "asc" => Some((column.as_str(), false)),
            "desc" => Some((column.as_str(), true)),
            _ => None,
        })
        .collect();
    if !orders.is_empty() {
        selected.sort_by(|a, b| {
            for (column, descending) in &orders {
                let left = resolve(&rows[*a], column).unwrap_or(Value::Null);
                let right = resolve(&rows[*b], column).unwrap_or(Value::Null);
                let ordering = ordered(&left, &right);
                if ordering != Ordering::Equal {
                    return if *descending { ordering.reverse() } else { ordering };
                }
            }
            Ordering::Equal
        });
    }
    if let Some((count, offset)) = query.limit_window() {
        selected = selected
            .into_iter()
            .skip(offset)
            .take(count.unwrap_or(usize::MAX))
            .collect();
    }
    Ok(selected)
}

fn key(row: &Attributes, index: Option<&str>, position: usize) -> String {
    index
        .and_then(|index| resolve(row, index))
        .filter(|value| !value.is_null())
        .map(|value| to_string(&value))
        .unwrap_or_else(|| position.to_string())
}

// ------------- Storage -------------
impl Storage for InMemoryStorage {
    fn tables(&self) -> &Tables {
        &self.tables
    }
    fn find(&self, query: &Query, id: &Value) -> Result<Option<Attributes>> {
        let primary_key = self.primary_key(query.table());
        let query = query.clone().where_(&primary_key, "=", id.clone());
        self.first(&query)
    }
    fn first(&self, query: &Query) -> Result<Option<Attributes>> {
        let offset = query.limit_window().map(|(_, offset)| offset).unwrap_or(0);
        let query = query.clone().limit(Some(1), offset);
        Ok(self.get(&query)?.into_iter().next().map(|(_, item)| item))
    }
    fn get(&self, query: &Query) -> Result<Items> {
        let data = self.data.lock()?;
        let mut items = Items::new();
        if let Some(table) = data.get(query.table()) {
            for (position, selected) in select(&table.rows, query)?.into_iter().enumerate() {
                let row = &table.rows[selected];
                items.push(key(row, query.index_column(), position), row.clone());
            }
        }
        Ok(items)
    }
    fn count(&self, query: &Query) -> Result<usize> {
        let data = self.data.lock()?;
        match data.get(query.table()) {
            Some(table) => {
                let mut count = 0;
                for row in &table.rows {
                    let mut keep = true;
                    for clause in query.clauses() {
                        if !matches(row, clause)? {
                            keep = false;
                            break;
                        }
                    }
                    count += keep as usize;
                }
                Ok(count)
            }
            None => Ok(0),
        }
    }
    fn insert(&self, query: &Query, attributes: Attributes) -> Result<Attributes> {
        let table = self.tables.get(query.table());
        let mut item = retain(attributes, table.as_ref());
        let mut data = self.data.lock()?;
        let stored = data.entry(query.table().to_owned()).or_default();
        if let Some(primary_key) = table.and_then(|table| table.primary_key) {
            match item.get(&primary_key) {
                Some(id) if !id.is_null() => {
                    if is_numeric(id) {
                        stored.last_id = stored.last_id.max(to_int(id));
                    }
                }
                _ => {
                    stored.last_id = stored.last_id.checked_add(1).ok_or_else(|| {
                        StrataError::Storage(format!(
                            "primary key '{}' of table '{}' is exhausted",
                            primary_key,
                            query.table()
                        ))
                    })?;
                    item.insert(primary_key, Value::from(stored.last_id));
                }
            }
        }
        trace!(table = query.table(), "insert");
        stored.rows.push(item.clone());
        Ok(item)
    }
    fn update(&self, query: &Query, attributes: Attributes) -> Result<Items> {
        let table = self.tables.get(query.table());
        let attributes = retain(attributes, table.as_ref());
        let mut data = self.data.lock()?;
        let mut items = Items::new();
        let stored = match data.get_mut(query.table()) {
            Some(stored) => stored,
            None => return Ok(items),
        };
        for (position, selected) in select(&stored.rows, query)?.into_iter().enumerate() {
            let row = &mut stored.rows[selected];
            for (name, value) in &attributes {
                row.insert(name.clone(), value.clone());
            }
            items.push(key(row, query.index_column(), position), row.clone());
        }
        trace!(table = query.table(), rows = items.len(), "update");
        if self.returning_items {
            Ok(items)
        } else {
            Ok(Items::new())
        }
    }
    fn delete(&self, query: &Query) -> Result<Items> {
        let mut data = self.data.lock()?;
        let mut items = Items::new();
        let stored = match data.get_mut(query.table()) {
            Some(stored) => stored,
            None => return Ok(items),
        };
        let selected = select(&stored.rows, query)?;
        for (position, row) in selected.iter().enumerate() {
            let row = &stored.rows[*row];
            items.push(key(row, query.index_column(), position), row.clone());
        }
        let mut doomed = selected;
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for position in doomed {
            stored.rows.remove(position);
        }
        trace!(table = query.table(), rows = items.len(), "delete");
        if self.returning_items {
            Ok(items)
        } else {
            Ok(Items::new())
        }
    }
    fn supports_returning_items(&self, method: WriteMethod) -> bool {
        match method {
            WriteMethod::Insert => true,
            WriteMethod::Update | WriteMethod::Delete => self.returning_items,
        }
    }
}
