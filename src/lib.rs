//! Strata – typed, locale-aware repositories over a pluggable storage.
//!
//! Strata sits between application code and whatever keeps its items. Every
//! attribute passing through a repository is described by a *column*:
//! * A [`datatype::Type`] is a bag of parameters (`type`, `default`, schema
//!   hints) that casts raw values into one of a fixed set of cast kinds.
//! * A [`column::Column`] binds a name to a type and optional read/write hooks.
//!   Provided kinds are [`column::Boolean`], [`column::Integer`],
//!   [`column::FloatCol`], [`column::Text`], [`column::Datetime`],
//!   [`column::Json`], [`column::Id`] and [`column::Translatable`].
//! * A [`columns::Columns`] set processes whole attribute maps, injecting
//!   defaults for missing attributes on write.
//!
//! Translatable columns store one value per locale as a JSON object and read
//! back as [`translation::StringTranslations`] or
//! [`translation::ArrayTranslations`], which resolve missing locales through
//! one-hop fallbacks. Locale state travels as an explicit
//! [`locale::LocaleContext`], so a column set can be shared across threads.
//!
//! ## Modules
//! * [`datatype`] – Type parameters and the cast dispatcher, plus the loose scalar helpers.
//! * [`column`] / [`columns`] – Column kinds and ordered column sets.
//! * [`translation`] – Read-side translation value objects.
//! * [`query`] – Maps declarative `where` / `order_by` / `limit` parameters onto storage queries.
//! * [`storage`] – The storage contract: queries, items, the table registry.
//! * [`persist`] – An in-memory storage implementing the contract.
//! * [`repository`] – [`repository::StorageRepository`], composing storage, columns,
//!   an entity factory and locale state.
//! * [`settings`] – Locale settings from a file and `STRATA_*` environment variables.
//! * [`schema`] – Table definitions derived from storable columns.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use strata::{column::{Boolean, Id, Text}, columns::Columns, persist::InMemoryStorage};
//! use strata::repository::StorageRepository;
//!
//! let columns = Columns::new()
//!     .with(Id::new())
//!     .with(Text::new("sku"))
//!     .with(Boolean::new("active").default_value(true));
//! let products = StorageRepository::new(Arc::new(InMemoryStorage::new()), "products", columns);
//! let attributes = json!({"sku": "pen"}).as_object().cloned().unwrap_or_default();
//! let product = products.create(attributes).unwrap();
//! assert_eq!(product.get_value("active"), Some(&json!(true)));
//! assert_eq!(product.get_value("id"), Some(&json!(1)));
//! ```

pub mod column;
pub mod columns;
pub mod datatype;
pub mod dater;
pub mod entity;
pub mod error;
pub mod locale;
pub mod persist;
pub mod query;
pub mod repository;
pub mod schema;
pub mod settings;
pub mod storage;
pub mod translation;

pub use error::{Result, StrataError};

/// An ordered map of attribute name to raw value.
pub type Attributes = serde_json::Map<String, serde_json::Value>;
