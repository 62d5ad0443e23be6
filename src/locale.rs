use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The locale state a read or write runs under.
///
/// `locale` is the current locale, `locales` the active ones (translations
/// in any other locale are dropped) and `locale_fallbacks` maps a locale to
/// the one used in its place when it has no translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleContext {
    locale: String,
    locales: Vec<String>,
    locale_fallbacks: HashMap<String, String>,
}

impl Default for LocaleContext {
    fn default() -> Self {
        Self {
            locale: String::from("en"),
            locales: vec![String::from("en")],
            locale_fallbacks: HashMap::new(),
        }
    }
}

impl LocaleContext {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.set_locale(locale);
        self
    }
    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_locales(locales);
        self
    }
    pub fn with_locale_fallbacks<I, K, V>(mut self, locale_fallbacks: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set_locale_fallbacks(locale_fallbacks);
        self
    }
    pub fn set_locale(&mut self, locale: impl Into<String>) {
        self.locale = locale.into();
    }
    pub fn set_locales<I, S>(&mut self, locales: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
    }
    pub fn set_locale_fallbacks<I, K, V>(&mut self, locale_fallbacks: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.locale_fallbacks = locale_fallbacks
            .into_iter()
            .map(|(locale, fallback)| (locale.into(), fallback.into()))
            .collect();
    }
    pub fn locale(&self) -> &str {
        &self.locale
    }
    pub fn locales(&self) -> &[String] {
        &self.locales
    }
    pub fn locale_fallbacks(&self) -> &HashMap<String, String> {
        &self.locale_fallbacks
    }
    pub fn is_active(&self, locale: &str) -> bool {
        self.locales.iter().any(|active| active == locale)
    }
    pub fn fallback(&self, locale: &str) -> Option<&str> {
        self.locale_fallbacks.get(locale).map(String::as_str)
    }
}
