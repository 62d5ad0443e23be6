use serde_json::{Value, json};
use std::sync::Arc;
use strata::column::{Boolean, Column, FloatCol, Id, Integer, Json, Text};
use strata::columns::Columns;
use strata::entity::{Entity, EntityFactory};
use strata::locale::LocaleContext;
use strata::persist::InMemoryStorage;
use strata::query::Limit;
use strata::repository::StorageRepository;
use strata::{Attributes, StrataError};
use tracing_subscriber::EnvFilter;

fn attributes(value: Value) -> Attributes {
    value.as_object().cloned().expect("attributes must be an object")
}

fn columns() -> Columns {
    Columns::new()
        .with(Id::new())
        .with(Text::new("sku"))
        .with(FloatCol::new("price"))
        .with(Integer::new("stock"))
        .with(Boolean::new("active"))
        .with(Json::new("options"))
}

fn setup() -> StorageRepository<InMemoryStorage> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let repository = StorageRepository::new(Arc::new(InMemoryStorage::new()), "products", columns());
    for product in [
        json!({"sku": "pen", "price": 1.5, "stock": 10, "active": true, "options": {"color": "blue", "tags": ["new"]}}),
        json!({"sku": "pencil", "price": 0.5, "stock": 0, "active": false, "options": {"color": "grey"}}),
        json!({"sku": "paper", "price": 4.0, "stock": 200, "active": true, "options": {}}),
    ] {
        repository.create(attributes(product)).expect("create");
    }
    repository
}

fn skus(entities: impl IntoIterator<Item = (String, Entity)>) -> Vec<String> {
    entities
        .into_iter()
        .filter_map(|(_, entity)| entity.get_value("sku").and_then(Value::as_str).map(String::from))
        .collect()
}

#[test]
fn find_by_id() {
    let repository = setup();
    let pencil = repository.find_by_id(2).expect("find").expect("pencil");
    assert_eq!(pencil.get_value("sku"), Some(&json!("pencil")));
    assert_eq!(pencil.get_value("active"), Some(&json!(false)));
    assert!(repository.find_by_id(99).expect("find").is_none());
}

#[test]
fn find_by_ids_keys_by_primary_key() {
    let repository = setup();
    let found = repository.find_by_ids([3, 1]).expect("find");
    assert_eq!(found.keys().collect::<Vec<_>>(), vec!["1", "3"]);
    assert_eq!(found.get("3").and_then(|e| e.get_value("sku")), Some(&json!("paper")));
}

#[test]
fn find_by_ids_without_primary_key_finds_nothing() {
    let storage = Arc::new(InMemoryStorage::new());
    let repository = StorageRepository::new(storage, "notes", Columns::new().with(Text::new("body")));
    repository.create(attributes(json!({"body": "hi"}))).expect("create");
    assert!(repository.find_by_ids([1]).expect("find").is_empty());
}

#[test]
fn find_one_with_conditions() {
    let repository = setup();
    let found = repository
        .find_one(&json!({"price": {">": 1}, "active": true}))
        .expect("find")
        .expect("entity");
    assert_eq!(found.get_value("sku"), Some(&json!("pen")));
    assert!(repository.find_one(&json!({"sku": "ink"})).expect("find").is_none());
}

#[test]
fn find_all_orders_and_limits() {
    let repository = setup();
    let all = repository
        .find_all(&json!({}), &json!({"price": "desc"}), Limit::None)
        .expect("find");
    assert_eq!(skus(all), vec!["paper", "pen", "pencil"]);

    let window = repository
        .find_all(&json!({}), &json!({"price": "asc"}), Limit::from_value(&json!([2, 1])))
        .expect("find");
    assert_eq!(window.keys().collect::<Vec<_>>(), vec!["1", "3"]);
    assert_eq!(skus(window), vec!["pen", "paper"]);

    let capped = repository
        .find_all(&json!({}), &json!({"sku": "sideways"}), Limit::Count(1))
        .expect("find");
    assert_eq!(skus(capped), vec!["pen"], "unknown directions keep storage order");
}

#[test]
fn find_all_with_operators() {
    let repository = setup();
    let found = repository
        .find_all(&json!({"price": {"between": [1, 4]}}), &json!({}), Limit::None)
        .expect("find");
    assert_eq!(skus(found), vec!["pen", "paper"]);

    let found = repository
        .find_all(&json!({"price": {"between": "bad"}}), &json!({}), Limit::None)
        .expect("find");
    assert!(found.is_empty());

    let found = repository
        .find_all(&json!({"sku": {"like": "pen%"}}), &json!({}), Limit::None)
        .expect("find");
    assert_eq!(skus(found), vec!["pen", "pencil"]);

    let found = repository
        .find_all(&json!({"sku": {"in": ["pen", "paper"]}, "stock": {"!=": 10}}), &json!({}), Limit::None)
        .expect("find");
    assert_eq!(skus(found), vec!["paper"]);
}

#[test]
fn find_all_inside_json() {
    let repository = setup();
    let found = repository
        .find_all(&json!({"options->color": "grey"}), &json!({}), Limit::None)
        .expect("find");
    assert_eq!(skus(found), vec!["pencil"]);

    let found = repository
        .find_all(&json!({"options->tags": {"contains": "new"}}), &json!({}), Limit::None)
        .expect("find");
    assert_eq!(skus(found), vec!["pen"]);

    let found = repository
        .find_all(&json!({"options->color": ["contains key"]}), &json!({}), Limit::None)
        .expect("find");
    assert_eq!(skus(found), vec!["pen", "pencil"]);
}

#[test]
fn unsupported_operators_are_rejected_by_storage() {
    let repository = setup();
    let result = repository.find_all(&json!({"sku": {"~=": "pen"}}), &json!({}), Limit::None);
    assert!(matches!(result, Err(StrataError::UnsupportedOperator(op)) if op == "~="));
}

#[test]
fn count() {
    let repository = setup();
    assert_eq!(repository.count(&json!({})).expect("count"), 3);
    assert_eq!(repository.count(&json!({"active": true})).expect("count"), 2);
    assert_eq!(repository.count(&json!({"stock": {">=": 10}})).expect("count"), 2);
}

#[derive(Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
}

struct ProductFactory;

impl EntityFactory for ProductFactory {
    type Entity = Product;
    fn create_entity(&self, attributes: Attributes, columns: &Columns, locales: &LocaleContext) -> Product {
        let entity = columns.process_reading(attributes, locales);
        Product {
            sku: entity.get_value("sku").and_then(Value::as_str).unwrap_or_default().to_owned(),
            price: entity.get_value("price").and_then(Value::as_f64).unwrap_or_default(),
        }
    }
}

#[test]
fn custom_entity_factory() {
    let storage = Arc::new(InMemoryStorage::new());
    let repository = StorageRepository::with_factory(storage, "products", columns(), ProductFactory);
    let created = repository
        .create(attributes(json!({"sku": "pen", "price": "2.25"})))
        .expect("create");
    assert_eq!(created, Product { sku: String::from("pen"), price: 2.25 });
    let found = repository.find_one(&json!({"sku": "pen"})).expect("find");
    assert_eq!(found, Some(Product { sku: String::from("pen"), price: 2.25 }));
}

#[test]
fn repositories_share_a_storage() {
    let storage = Arc::new(InMemoryStorage::new());
    let products = StorageRepository::new(storage.clone(), "products", columns());
    let notes = StorageRepository::new(storage.clone(), "notes", Columns::new().with(Id::named("note_id")).with(Text::new("body")));
    products.create(attributes(json!({"sku": "pen"}))).expect("create");
    notes.create(attributes(json!({"body": "restock"}))).expect("create");
    assert_eq!(products.primary_key().as_deref(), Some("id"));
    assert_eq!(notes.primary_key().as_deref(), Some("note_id"));
    assert_eq!(notes.find_by_id(1).expect("find").and_then(|n| n.get_value("body").cloned()), Some(json!("restock")));
    assert_eq!(storage.rows("products").expect("rows").len(), 1);
    let registered = notes.columns().storable(true).names();
    assert_eq!(registered, vec!["note_id", "body"]);
    assert!(notes.columns().get("body").is_some_and(|c| c.is_storable()));
}
