//! Read-side value objects for translatable columns.
//!
//! A translation set is an immutable snapshot of `locale -> value` taken
//! when a translatable column is read. Lookups without an explicit locale
//! use the locale current at read time, and a locale without translation
//! is substituted by its configured fallback (one hop, no chains).

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::datatype::to_string;
use crate::locale::LocaleContext;

fn lookup<'m>(
    requested: Option<&str>,
    current: &str,
    fallbacks: &HashMap<String, String>,
    translations: &'m Map<String, Value>,
) -> Option<&'m Value> {
    let locale = requested.unwrap_or(current);
    if let Some(value) = translations.get(locale) {
        return Some(value);
    }
    let fallback = fallbacks.get(locale).map(String::as_str).unwrap_or(locale);
    translations.get(fallback)
}

/// Looks up a dotted path such as `a.b.0` inside a value.
pub fn dotted<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(list) => segment.parse::<usize>().ok().and_then(|i| list.get(i)),
        _ => None,
    })
}

// ------------- String translations -------------
#[derive(Debug, Clone, PartialEq)]
pub struct StringTranslations {
    translations: Map<String, Value>,
    locale: String,
    locale_fallbacks: HashMap<String, String>,
}

impl StringTranslations {
    pub fn new<I, K, V>(translations: I, locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            translations: translations
                .into_iter()
                .map(|(locale, value)| (locale.into(), Value::String(value.into())))
                .collect(),
            locale: locale.into(),
            locale_fallbacks: HashMap::new(),
        }
    }
    pub fn with_locale_fallbacks<I, K, V>(mut self, locale_fallbacks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.locale_fallbacks = locale_fallbacks
            .into_iter()
            .map(|(locale, fallback)| (locale.into(), fallback.into()))
            .collect();
        self
    }
    pub(crate) fn from_map(translations: Map<String, Value>, locales: &LocaleContext) -> Self {
        Self {
            translations: translations
                .into_iter()
                .map(|(locale, value)| match value {
                    Value::String(_) => (locale, value),
                    other => (locale, Value::String(to_string(&other))),
                })
                .collect(),
            locale: locales.locale().to_owned(),
            locale_fallbacks: locales.locale_fallbacks().clone(),
        }
    }
    /// The translation in the current locale, or an empty string.
    pub fn get(&self) -> &str {
        self.get_or(None, "")
    }
    pub fn get_in(&self, locale: &str) -> &str {
        self.get_or(Some(locale), "")
    }
    pub fn get_or<'a>(&'a self, locale: Option<&str>, default: &'a str) -> &'a str {
        lookup(locale, &self.locale, &self.locale_fallbacks, &self.translations)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }
    pub fn has(&self, locale: &str) -> bool {
        self.translations.contains_key(locale)
    }
    pub fn all(&self) -> &Map<String, Value> {
        &self.translations
    }
    pub fn locale(&self) -> &str {
        &self.locale
    }
    pub fn len(&self) -> usize {
        self.translations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.translations
            .iter()
            .map(|(locale, value)| (locale.as_str(), value.as_str().unwrap_or("")))
    }
    pub fn to_value(&self) -> Value {
        Value::Object(self.translations.clone())
    }
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
impl fmt::Display for StringTranslations {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
impl Serialize for StringTranslations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.translations.serialize(serializer)
    }
}

// ------------- Array translations -------------
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayTranslations {
    translations: Map<String, Value>,
    locale: String,
    locale_fallbacks: HashMap<String, String>,
}

impl ArrayTranslations {
    pub fn new<I, K>(translations: I, locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            translations: translations
                .into_iter()
                .map(|(locale, value)| (locale.into(), value))
                .collect(),
            locale: locale.into(),
            locale_fallbacks: HashMap::new(),
        }
    }
    pub fn with_locale_fallbacks<I, K, V>(mut self, locale_fallbacks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.locale_fallbacks = locale_fallbacks
            .into_iter()
            .map(|(locale, fallback)| (locale.into(), fallback.into()))
            .collect();
        self
    }
    pub(crate) fn from_map(translations: Map<String, Value>, locales: &LocaleContext) -> Self {
        Self {
            translations,
            locale: locales.locale().to_owned(),
            locale_fallbacks: locales.locale_fallbacks().clone(),
        }
    }
    /// Returns the value of the locale (current one if `None`), or with a
    /// `key` the value found at that dotted path inside it.
    pub fn get(&self, locale: Option<&str>, key: Option<&str>) -> Option<&Value> {
        let value = lookup(locale, &self.locale, &self.locale_fallbacks, &self.translations)?;
        let value = match key {
            Some(key) => dotted(value, key)?,
            None => value,
        };
        if value.is_null() { None } else { Some(value) }
    }
    pub fn get_or<'a>(&'a self, locale: Option<&str>, key: Option<&str>, default: &'a Value) -> &'a Value {
        self.get(locale, key).unwrap_or(default)
    }
    /// The value in the current locale.
    pub fn current(&self) -> Option<&Value> {
        self.get(None, None)
    }
    pub fn has(&self, locale: &str, key: Option<&str>) -> bool {
        match (self.translations.get(locale), key) {
            (Some(value), Some(key)) => dotted(value, key).is_some(),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
    pub fn all(&self) -> &Map<String, Value> {
        &self.translations
    }
    pub fn locale(&self) -> &str {
        &self.locale
    }
    pub fn len(&self) -> usize {
        self.translations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.translations.iter().map(|(locale, value)| (locale.as_str(), value))
    }
    pub fn to_value(&self) -> Value {
        Value::Object(self.translations.clone())
    }
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}
impl fmt::Display for ArrayTranslations {
    // a plain string in the current locale prints as is, anything else as JSON
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.current() {
            Some(Value::String(s)) => write!(f, "{}", s),
            _ => write!(f, "{}", self.to_json()),
        }
    }
}
impl Serialize for ArrayTranslations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.translations.serialize(serializer)
    }
}
