// used for the column and index definitions handed to schema builders
use serde::Serialize;
use serde_json::Value;

use crate::columns::Columns;
use crate::datatype::Parameters;

/// Table definition derived from the storable columns of a repository.
///
/// Each column definition is the type parameters of a column plus its
/// `name`. An `index` parameter holding a list or an object becomes an index
/// definition, anything else there is left to the column definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaTable {
    pub name: String,
    pub columns: Vec<Parameters>,
    pub indexes: Vec<Value>,
}

impl SchemaTable {
    pub fn from_columns(name: &str, columns: &Columns) -> Self {
        let mut table = SchemaTable {
            name: name.to_owned(),
            columns: Vec::new(),
            indexes: Vec::new(),
        };
        for column in columns.storable(true).iter() {
            let column_type = column.column_type();
            let mut definition = column_type.parameters().clone();
            definition.insert(String::from("name"), Value::from(column.name()));
            table.columns.push(definition);
            if let Some(index @ (Value::Array(_) | Value::Object(_))) = column_type.get("index") {
                table.indexes.push(index.clone());
            }
        }
        table
    }
    pub fn column(&self, name: &str) -> Option<&Parameters> {
        self.columns
            .iter()
            .find(|definition| definition.get("name").and_then(Value::as_str) == Some(name))
    }
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
