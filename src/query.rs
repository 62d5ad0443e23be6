//! Maps declarative query parameters onto a storage [`Query`].
//!
//! A `where` parameter is a JSON object of `column => condition`. The column
//! may address a path inside a JSON column (`options->color`). A condition is
//! either a value compared for equality, an object of `operator => operand`
//! pairs, or a list of bare operators such as `["null"]`. Conditions on a
//! translatable column address the current locale unless a locale is named
//! in the path already.

// used for the dynamic values of query parameters
use serde_json::Value;

// used to print out column paths
use std::fmt;

// used to log rewritten column paths
use tracing::trace;

use crate::columns::Columns;
use crate::datatype::{is_numeric, to_int, to_string};
use crate::locale::LocaleContext;
use crate::storage::Query;

const PATH_SEPARATOR: &str = "->";

// ------------- Column paths -------------
/// A column name with optional JSON path segments, `name->seg1->seg2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    pub name: String,
    pub segments: Option<Vec<String>>,
}

impl ColumnPath {
    pub fn parse(expression: &str) -> Self {
        let mut parts = expression.split(PATH_SEPARATOR).map(str::trim);
        let name = parts.next().unwrap_or_default().to_owned();
        let segments: Vec<String> = parts.map(str::to_owned).collect();
        Self {
            name,
            segments: if segments.is_empty() { None } else { Some(segments) },
        }
    }
    pub fn with_segments(&self, segments: Vec<String>) -> Self {
        Self {
            name: self.name.clone(),
            segments: if segments.is_empty() { None } else { Some(segments) },
        }
    }
    pub fn segments(&self) -> &[String] {
        self.segments.as_deref().unwrap_or_default()
    }
}
impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for segment in self.segments() {
            write!(f, "{}{}", PATH_SEPARATOR, segment)?;
        }
        Ok(())
    }
}

/// Points a path on a translatable column at the current locale, unless one
/// of its segments names an active locale already.
pub fn localize(path: ColumnPath, locales: &LocaleContext) -> ColumnPath {
    if path.segments().iter().any(|segment| locales.is_active(segment)) {
        return path;
    }
    let mut segments = vec![locales.locale().to_owned()];
    segments.extend(path.segments().iter().cloned());
    path.with_segments(segments)
}

// ------------- Where -------------
pub fn apply_where(
    mut query: Query,
    conditions: &Value,
    columns: &Columns,
    locales: &LocaleContext,
) -> Query {
    let conditions = match conditions {
        Value::Object(conditions) => conditions,
        _ => return query,
    };
    let translatable = columns.translatable(true);
    for (expression, condition) in conditions {
        let mut path = ColumnPath::parse(expression);
        if translatable.contains(&path.name) {
            path = localize(path, locales);
        }
        let column = path.to_string();
        if column != *expression {
            trace!(from = %expression, to = %column, "localized column path");
        }
        match condition {
            Value::Object(pairs) if !pairs.is_empty() => {
                for (operator, operand) in pairs {
                    query = map_clause(query, &column, operator, operand.clone());
                }
            }
            // ['null'] and the like, operators without operand
            Value::Array(operators) if !operators.is_empty() => {
                for operator in operators {
                    let operator = operator.as_str().unwrap_or("=");
                    query = map_clause(query, &column, operator, Value::Null);
                }
            }
            value => query = query.where_(&column, "=", value.clone()),
        }
    }
    query
}

fn map_clause(query: Query, column: &str, operator: &str, operand: Value) -> Query {
    trace!(column, operator, "where clause");
    match operator {
        "between" => query.where_between(column, bounds(operand)),
        "not between" => query.where_not_between(column, bounds(operand)),
        "null" => query.where_null(column),
        "not null" => query.where_not_null(column),
        "in" => query.where_in(column, operand),
        "not in" => query.where_not_in(column, operand),
        "contains" => query.where_json_contains(column, operand),
        "contains key" => query.where_json_contains_key(column),
        _ => query.where_(column, operator, operand),
    }
}

fn bounds(operand: Value) -> Vec<Value> {
    match operand {
        Value::Array(bounds) => bounds,
        Value::Object(bounds) => bounds.into_iter().map(|(_, bound)| bound).collect(),
        _ => Vec::new(),
    }
}

// ------------- Order by -------------
/// Applies `column => direction` pairs, where a list of directions orders
/// by the same column repeatedly.
pub fn apply_order_by(mut query: Query, order_by: &Value) -> Query {
    let order_by = match order_by {
        Value::Object(order_by) => order_by,
        _ => return query,
    };
    for (column, direction) in order_by {
        match direction {
            Value::Array(directions) => {
                for direction in directions {
                    query = query.order(column, &to_string(direction));
                }
            }
            direction => query = query.order(column, &to_string(direction)),
        }
    }
    query
}

// ------------- Limit -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    #[default]
    None,
    Count(usize),
    Window {
        count: Option<usize>,
        offset: usize,
    },
}

impl Limit {
    /// Reads `null`, a row count or a `[count, offset]` list. A non-numeric
    /// count means no cap, a non-numeric offset means 0.
    pub fn from_value(value: &Value) -> Limit {
        match value {
            Value::Number(_) => Limit::Count(to_int(value).max(0) as usize),
            Value::Array(window) => {
                let count = window
                    .first()
                    .filter(|count| is_numeric(count))
                    .map(|count| to_int(count).max(0) as usize);
                let offset = window
                    .get(1)
                    .filter(|offset| is_numeric(offset))
                    .map(|offset| to_int(offset).max(0) as usize)
                    .unwrap_or(0);
                Limit::Window { count, offset }
            }
            _ => Limit::None,
        }
    }
}
impl From<usize> for Limit {
    fn from(count: usize) -> Self {
        Limit::Count(count)
    }
}
impl From<(usize, usize)> for Limit {
    fn from((count, offset): (usize, usize)) -> Self {
        Limit::Window {
            count: Some(count),
            offset,
        }
    }
}

pub fn apply_limit(query: Query, limit: Limit) -> Query {
    match limit {
        Limit::None => query,
        Limit::Count(count) => query.limit(Some(count), 0),
        Limit::Window { count, offset } => query.limit(count, offset),
    }
}
