//! Typed column descriptors.
//!
//! A column binds an attribute name to a [`Type`] and optional transform
//! hooks. Reading casts a stored value into its application form, writing
//! prepares an application value for storage. The hook signature is fixed
//! per column kind: plain columns see `(value, attributes)`, [`Datetime`]
//! additionally gets a [`DateFormatter`] and [`Translatable`] gets the locale
//! of the translation at hand.

// used for the instants a datetime reader may hand back
use chrono::NaiveDateTime;

// used for the dynamic values flowing through columns
use serde_json::{Map, Value};

// used to share hooks between clones of a column
use std::sync::Arc;

// used to print out columns, whose hooks cannot print themselves
use std::fmt;

use crate::Attributes;
use crate::datatype::{Parameters, Type, empty_array, is_array};
use crate::dater::{DATE_FORMAT, DATETIME_FORMAT, DateFormatter, TIME_FORMAT};
use crate::error::{Result, StrataError};
use crate::locale::LocaleContext;
use crate::translation::{ArrayTranslations, StringTranslations};

pub type Hook = Arc<dyn Fn(Value, &Attributes) -> Value + Send + Sync>;
pub type DatedReader = Arc<dyn Fn(&Value, &Attributes, &DateFormatter) -> Attribute + Send + Sync>;
pub type DatedWriter = Arc<dyn Fn(&Value, &Attributes, &DateFormatter) -> Value + Send + Sync>;
pub type LocalizedHook = Arc<dyn Fn(Value, &Attributes, &str) -> Value + Send + Sync>;

// ------------- Attribute -------------
/// A read attribute: a plain value, a translation set or an instant handed
/// back by a datetime reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Value(Value),
    Strings(StringTranslations),
    Arrays(ArrayTranslations),
    DateTime(NaiveDateTime),
}

impl Attribute {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Attribute::Value(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_strings(&self) -> Option<&StringTranslations> {
        match self {
            Attribute::Strings(translations) => Some(translations),
            _ => None,
        }
    }
    pub fn as_arrays(&self) -> Option<&ArrayTranslations> {
        match self {
            Attribute::Arrays(translations) => Some(translations),
            _ => None,
        }
    }
    pub fn as_datetime(&self) -> Option<&NaiveDateTime> {
        match self {
            Attribute::DateTime(instant) => Some(instant),
            _ => None,
        }
    }
    /// Flattens the attribute into JSON. Translations become objects and
    /// instants are printed as `Y-m-d H:i:s`.
    pub fn to_value(&self) -> Value {
        match self {
            Attribute::Value(value) => value.clone(),
            Attribute::Strings(translations) => translations.to_value(),
            Attribute::Arrays(translations) => translations.to_value(),
            Attribute::DateTime(instant) => {
                Value::String(instant.format(DATETIME_FORMAT).to_string())
            }
        }
    }
}
impl From<Value> for Attribute {
    fn from(value: Value) -> Self {
        Attribute::Value(value)
    }
}
impl From<NaiveDateTime> for Attribute {
    fn from(instant: NaiveDateTime) -> Self {
        Attribute::DateTime(instant)
    }
}
impl From<StringTranslations> for Attribute {
    fn from(translations: StringTranslations) -> Self {
        Attribute::Strings(translations)
    }
}
impl From<ArrayTranslations> for Attribute {
    fn from(translations: ArrayTranslations) -> Self {
        Attribute::Arrays(translations)
    }
}
impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Attribute::Value(Value::String(s)) => write!(f, "{}", s),
            Attribute::Value(value) => write!(f, "{}", value),
            Attribute::Strings(translations) => write!(f, "{}", translations),
            Attribute::Arrays(translations) => write!(f, "{}", translations),
            Attribute::DateTime(instant) => write!(f, "{}", instant.format(DATETIME_FORMAT)),
        }
    }
}

// ------------- Description -------------
/// Snapshot of the public properties of a column, used for projections.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_name: String,
    pub storable: bool,
    pub translatable: bool,
    pub parameters: Parameters,
}

impl ColumnDescription {
    /// Looks up `name`, `type`, `storable`, `translatable` or else any type
    /// parameter by name.
    pub fn property(&self, property: &str) -> Option<Value> {
        match property {
            "name" => Some(Value::from(self.name.as_str())),
            "type" => Some(Value::from(self.type_name.as_str())),
            "storable" => Some(Value::Bool(self.storable)),
            "translatable" => Some(Value::Bool(self.translatable)),
            _ => self.parameters.get(property).cloned(),
        }
    }
}

// ------------- Column -------------
pub trait Column: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn column_type(&self) -> &Type;
    fn is_storable(&self) -> bool;
    fn is_translatable(&self) -> bool {
        false
    }
    /// Turns a stored value into its application form.
    fn reading(&self, value: Value, attributes: &Attributes, locales: &LocaleContext) -> Attribute;
    /// Turns an application value into its storage form.
    fn writing(&self, value: Value, attributes: &Attributes, locales: &LocaleContext) -> Value;
    fn describe(&self) -> ColumnDescription {
        ColumnDescription {
            name: self.name().to_owned(),
            type_name: self.column_type().type_name().to_owned(),
            storable: self.is_storable(),
            translatable: self.is_translatable(),
            parameters: self.column_type().parameters().clone(),
        }
    }
}

fn allowed(column: &str, type_name: &str, types: &[&str]) -> Result<()> {
    if types.contains(&type_name) {
        Ok(())
    } else {
        Err(StrataError::InvalidConfiguration(format!(
            "{} type must be one of {}, got '{}'",
            column,
            types.join(", "),
            type_name
        )))
    }
}

/// Entries of an object, or of a list keyed by position.
fn entries(value: Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        Value::Array(list) => list
            .into_iter()
            .enumerate()
            .map(|(i, value)| (i.to_string(), value))
            .collect(),
        _ => Vec::new(),
    }
}

#[derive(Clone)]
struct Base {
    name: String,
    column_type: Type,
    storable: bool,
    reader: Option<Hook>,
    writer: Option<Hook>,
}

impl Base {
    fn new(name: impl Into<String>, type_name: &str) -> Self {
        Self {
            name: name.into(),
            column_type: Type::named(type_name),
            storable: true,
            reader: None,
            writer: None,
        }
    }
    fn reading(&self, value: Value, attributes: &Attributes) -> Value {
        let value = self.column_type.cast(&value);
        match &self.reader {
            Some(reader) => reader(value, attributes),
            None => value,
        }
    }
    fn writing(&self, value: Value, attributes: &Attributes) -> Value {
        let value = self.column_type.cast(&value);
        match &self.writer {
            Some(writer) => writer(value, attributes),
            None => value,
        }
    }
}
impl fmt::Debug for Base {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Base")
            .field("name", &self.name)
            .field("column_type", &self.column_type)
            .field("storable", &self.storable)
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

// builder methods every column kind shares
macro_rules! column_builders {
    ($column:ident) => {
        impl $column {
            /// Merges further type parameters. The type name set at
            /// construction cannot be changed this way.
            pub fn extend_type<K, I>(mut self, parameters: I) -> Self
            where
                K: Into<String>,
                I: IntoIterator<Item = (K, Value)>,
            {
                self.base.column_type.extend(parameters);
                self
            }
            pub fn default_value(mut self, value: impl Into<Value>) -> Self {
                self.base.column_type.extend([("default", value.into())]);
                self
            }
            pub fn storable(mut self, storable: bool) -> Self {
                self.base.storable = storable;
                self
            }
        }
    };
}

macro_rules! plain_column {
    ($(#[$meta:meta])* $column:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $column {
            base: Base,
        }
        column_builders!($column);
        impl $column {
            /// Replaces the hook applied after casting on read.
            pub fn read<F>(mut self, reader: F) -> Self
            where
                F: Fn(Value, &Attributes) -> Value + Send + Sync + 'static,
            {
                self.base.reader = Some(Arc::new(reader));
                self
            }
            /// Replaces the hook applied after casting on write.
            pub fn write<F>(mut self, writer: F) -> Self
            where
                F: Fn(Value, &Attributes) -> Value + Send + Sync + 'static,
            {
                self.base.writer = Some(Arc::new(writer));
                self
            }
        }
        impl Column for $column {
            fn name(&self) -> &str {
                &self.base.name
            }
            fn column_type(&self) -> &Type {
                &self.base.column_type
            }
            fn is_storable(&self) -> bool {
                self.base.storable
            }
            fn reading(&self, value: Value, attributes: &Attributes, _: &LocaleContext) -> Attribute {
                Attribute::Value(self.base.reading(value, attributes))
            }
            fn writing(&self, value: Value, attributes: &Attributes, _: &LocaleContext) -> Value {
                self.base.writing(value, attributes)
            }
        }
    };
}

// ------------- Plain columns -------------
plain_column!(
    /// A `bool` column.
    Boolean
);
impl Boolean {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "bool"),
        }
    }
}

plain_column!(
    /// An `int`, `tinyInt` or `bigInt` column.
    Integer
);
impl Integer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "int"),
        }
    }
    pub fn with_type(name: impl Into<String>, type_name: &str) -> Result<Self> {
        allowed("Integer", type_name, &["int", "tinyInt", "bigInt"])?;
        Ok(Self {
            base: Base::new(name, type_name),
        })
    }
}

plain_column!(
    /// A `double`, `float` or `decimal` column.
    FloatCol
);
impl FloatCol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "float"),
        }
    }
    pub fn with_type(name: impl Into<String>, type_name: &str) -> Result<Self> {
        allowed("FloatCol", type_name, &["double", "float", "decimal"])?;
        Ok(Self {
            base: Base::new(name, type_name),
        })
    }
}

plain_column!(
    /// A `char`, `string` or `text` column.
    Text
);
impl Text {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "string"),
        }
    }
    pub fn with_type(name: impl Into<String>, type_name: &str) -> Result<Self> {
        allowed("Text", type_name, &["char", "string", "text"])?;
        Ok(Self {
            base: Base::new(name, type_name),
        })
    }
}

plain_column!(
    /// A `json` column, read and written as a container.
    Json
);
impl Json {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "json"),
        }
    }
}

plain_column!(
    /// A primary key column, `bigPrimary` named `id` unless told otherwise.
    Id
);
impl Id {
    pub fn new() -> Self {
        Self::named("id")
    }
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "bigPrimary"),
        }
    }
    pub fn with_type(name: impl Into<String>, type_name: &str) -> Result<Self> {
        allowed("Id", type_name, &["primary", "bigPrimary"])?;
        Ok(Self {
            base: Base::new(name, type_name),
        })
    }
}
impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Datetime -------------
/// A `datetime`, `date`, `time` or `timestamp` column.
///
/// Reading only makes sure the value is a string. Writing reformats any
/// input into the layout of the declared type, where unusable input counts
/// as now. Custom hooks replace this handling entirely.
#[derive(Clone)]
pub struct Datetime {
    base: Base,
    reader: Option<DatedReader>,
    writer: Option<DatedWriter>,
}
column_builders!(Datetime);

impl Datetime {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "datetime"),
            reader: None,
            writer: None,
        }
    }
    pub fn with_type(name: impl Into<String>, type_name: &str) -> Result<Self> {
        allowed("Datetime", type_name, &["datetime", "date", "time", "timestamp"])?;
        Ok(Self {
            base: Base::new(name, type_name),
            reader: None,
            writer: None,
        })
    }
    pub fn read<F, R>(mut self, reader: F) -> Self
    where
        F: Fn(&Value, &Attributes, &DateFormatter) -> R + Send + Sync + 'static,
        R: Into<Attribute>,
    {
        self.reader = Some(Arc::new(
            move |value: &Value, attributes: &Attributes, dater: &DateFormatter| {
                reader(value, attributes, dater).into()
            },
        ));
        self
    }
    pub fn write<F>(mut self, writer: F) -> Self
    where
        F: Fn(&Value, &Attributes, &DateFormatter) -> Value + Send + Sync + 'static,
    {
        self.writer = Some(Arc::new(writer));
        self
    }
}
impl Column for Datetime {
    fn name(&self) -> &str {
        &self.base.name
    }
    fn column_type(&self) -> &Type {
        &self.base.column_type
    }
    fn is_storable(&self) -> bool {
        self.base.storable
    }
    fn reading(&self, value: Value, attributes: &Attributes, _: &LocaleContext) -> Attribute {
        match &self.reader {
            Some(reader) => reader(&value, attributes, &DateFormatter::new()),
            None => Attribute::Value(self.base.column_type.cast(&value)),
        }
    }
    fn writing(&self, value: Value, attributes: &Attributes, _: &LocaleContext) -> Value {
        let dater = DateFormatter::new();
        if let Some(writer) = &self.writer {
            return writer(&value, attributes, &dater);
        }
        match self.base.column_type.type_name() {
            "date" => Value::String(dater.format(&value, DATE_FORMAT)),
            "time" => Value::String(dater.format(&value, TIME_FORMAT)),
            "timestamp" => Value::from(dater.timestamp(&value)),
            _ => Value::String(dater.format(&value, DATETIME_FORMAT)),
        }
    }
}
impl fmt::Debug for Datetime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Datetime")
            .field("base", &self.base)
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}

// ------------- Translatable -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    String,
    Array,
}

impl Subtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subtype::String => "string",
            Subtype::Array => "array",
        }
    }
}

/// A column holding one value per locale, stored as a JSON object.
///
/// Only translations in the active locales of the [`LocaleContext`] are
/// read or written, the others are dropped silently.
#[derive(Clone)]
pub struct Translatable {
    base: Base,
    subtype: Subtype,
    reader: Option<LocalizedHook>,
    writer: Option<LocalizedHook>,
}
column_builders!(Translatable);

impl Translatable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: Base::new(name, "json"),
            subtype: Subtype::String,
            reader: None,
            writer: None,
        }
    }
    pub fn with_subtype(name: impl Into<String>, subtype: &str) -> Result<Self> {
        let subtype = match subtype {
            "string" => Subtype::String,
            "array" => Subtype::Array,
            other => {
                return Err(StrataError::InvalidConfiguration(format!(
                    "Translatable subtype must be string or array, got '{}'",
                    other
                )));
            }
        };
        Ok(Self {
            subtype,
            ..Self::new(name)
        })
    }
    pub fn subtype(&self) -> Subtype {
        self.subtype
    }
    /// Replaces the hook applied to each cast translation on read.
    ///
    /// With the string subtype the results end up in [`StringTranslations`],
    /// so a non-string result is kept in its loose string form (`12` becomes
    /// `"12"`, `true` becomes `"1"`, `null` becomes `""`). The array subtype
    /// keeps results as they are.
    pub fn read<F>(mut self, reader: F) -> Self
    where
        F: Fn(Value, &Attributes, &str) -> Value + Send + Sync + 'static,
    {
        self.reader = Some(Arc::new(reader));
        self
    }
    /// Replaces the hook applied to each translation on write.
    pub fn write<F>(mut self, writer: F) -> Self
    where
        F: Fn(Value, &Attributes, &str) -> Value + Send + Sync + 'static,
    {
        self.writer = Some(Arc::new(writer));
        self
    }
}
impl Column for Translatable {
    fn name(&self) -> &str {
        &self.base.name
    }
    fn column_type(&self) -> &Type {
        &self.base.column_type
    }
    fn is_storable(&self) -> bool {
        self.base.storable
    }
    fn is_translatable(&self) -> bool {
        true
    }
    fn reading(&self, value: Value, attributes: &Attributes, locales: &LocaleContext) -> Attribute {
        let column_type = &self.base.column_type;
        let value = column_type.cast_as(&value, Some("json"), Some(&empty_array()));
        let mut translations = Map::new();
        for (locale, translation) in entries(value) {
            if !locales.is_active(&locale) {
                continue;
            }
            let translation = match self.subtype {
                Subtype::String => {
                    column_type.cast_as(&translation, Some("string"), Some(&Value::from("")))
                }
                Subtype::Array => {
                    column_type.cast_as(&translation, Some("json"), Some(&empty_array()))
                }
            };
            let translation = match &self.reader {
                Some(reader) => reader(translation, attributes, &locale),
                None => translation,
            };
            translations.insert(locale, translation);
        }
        match self.subtype {
            Subtype::String => StringTranslations::from_map(translations, locales).into(),
            Subtype::Array => ArrayTranslations::from_map(translations, locales).into(),
        }
    }
    fn writing(&self, value: Value, attributes: &Attributes, locales: &LocaleContext) -> Value {
        let value = match value {
            Value::String(s) => {
                let mut current = Map::new();
                current.insert(locales.locale().to_owned(), Value::String(s));
                Value::Object(current)
            }
            other => other,
        };
        let mut translations = Map::new();
        if !is_array(&value) {
            return Value::Object(translations);
        }
        for (locale, translation) in entries(value) {
            if !locales.is_active(&locale) {
                continue;
            }
            let translation = match &self.writer {
                Some(writer) => writer(translation, attributes, &locale),
                None => translation,
            };
            translations.insert(locale, translation);
        }
        Value::Object(translations)
    }
    fn describe(&self) -> ColumnDescription {
        let mut parameters = self.base.column_type.parameters().clone();
        parameters.insert(String::from("subtype"), Value::from(self.subtype.as_str()));
        ColumnDescription {
            name: self.base.name.clone(),
            type_name: self.base.column_type.type_name().to_owned(),
            storable: self.base.storable,
            translatable: true,
            parameters,
        }
    }
}
impl fmt::Debug for Translatable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Translatable")
            .field("base", &self.base)
            .field("subtype", &self.subtype)
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .finish()
    }
}
