use serde_json::{Value, json};
use strata::Attributes;
use strata::column::{Attribute, Boolean, Column, Id, Integer, Text, Translatable};
use strata::columns::Columns;
use strata::locale::LocaleContext;

fn attributes(value: Value) -> Attributes {
    value.as_object().cloned().expect("attributes must be an object")
}

fn three() -> Columns {
    Columns::new()
        .with(Translatable::new("foo"))
        .with(Translatable::new("bar"))
        .with(Text::new("lorem"))
}

#[test]
fn filter_returns_a_new_set() {
    let columns = Columns::new()
        .with(Text::new("foo"))
        .with(Text::new("bar").storable(false));
    let storable = columns.filter(|column| column.is_storable());
    assert_eq!(storable.len(), 1);
    assert_eq!(columns.len(), 2, "the original set is left alone");
}

#[test]
fn storable_views() {
    let columns = Columns::new()
        .with(Text::new("foo"))
        .with(Text::new("bar").storable(false))
        .with(Text::new("lorem").storable(false));
    assert_eq!(columns.storable(false).len(), 2);
    assert_eq!(columns.storable(true).names(), vec!["foo"]);
}

#[test]
fn translatable_views() {
    let columns = three();
    assert_eq!(columns.translatable(false).len(), 1);
    assert_eq!(columns.translatable(true).names(), vec!["foo", "bar"]);
}

#[test]
fn only_and_except() {
    let columns = three();
    assert_eq!(columns.only(&["foo", "lorem"]).names(), vec!["foo", "lorem"]);
    assert_eq!(columns.only(&["bar"]).len(), 1);
    assert_eq!(columns.except(&["foo", "lorem"]).names(), vec!["bar"]);
    assert_eq!(columns.except(&["bar"]).len(), 2);
}

#[test]
fn later_columns_replace_earlier_ones_in_place() {
    let columns = Columns::new()
        .with(Text::new("foo"))
        .with(Text::new("bar"))
        .with(Integer::new("foo"));
    assert_eq!(columns.names(), vec!["foo", "bar"]);
    let foo = columns.get("foo").expect("foo column");
    assert_eq!(foo.column_type().type_name(), "int");
}

#[test]
fn column_projection() {
    let columns = Columns::new().with(Text::new("foo")).with(Text::new("bar"));
    assert_eq!(columns.column("name"), vec![json!("foo"), json!("bar")]);
    assert_eq!(
        Value::Object(columns.column_indexed("name", "name")),
        json!({"foo": "foo", "bar": "bar"})
    );
    assert_eq!(
        Value::Object(columns.column_indexed("type", "name")),
        json!({"foo": "string", "bar": "string"})
    );
}

#[test]
fn get_and_empty() {
    let columns = Columns::new().with(Text::new("foo")).with(Text::new("bar"));
    assert_eq!(columns.get("foo").map(|column| column.name()), Some("foo"));
    assert!(columns.get("lorem").is_none());
    assert!(Columns::new().is_empty());
    assert!(!columns.is_empty());
}

#[test]
fn primary_is_the_first_primary_column() {
    assert!(Columns::new().primary().is_none());
    assert!(Columns::new().with(Text::new("foo")).primary().is_none());
    let columns = Columns::new()
        .with(Text::new("foo"))
        .with(Id::named("key"))
        .with(Id::new());
    assert_eq!(columns.primary().map(|column| column.name()), Some("key"));
}

#[test]
fn process_reading_passes_unknown_attributes_through() {
    let columns = Columns::new().with(Text::new("foo"));
    let locales = LocaleContext::default();
    let entity = columns.process_reading(attributes(json!({"foo": "a"})), &locales);
    assert_eq!(entity.to_value(), json!({"foo": "a"}));
    let entity = columns.process_reading(attributes(json!({"bar": 1, "foo": 2})), &locales);
    assert_eq!(entity.to_value(), json!({"bar": 1, "foo": "2"}));
    assert_eq!(entity.names().collect::<Vec<_>>(), vec!["bar", "foo"]);
}

fn counted_label() -> Columns {
    Columns::new()
        .with(Integer::new("count"))
        .with(Text::new("label").read(|value, attributes| {
            let count = attributes.get("count").cloned().unwrap_or(Value::Null);
            Value::from(format!("{}={}", value.as_str().unwrap_or_default(), count))
        }))
}

#[test]
fn process_reading_hooks_see_earlier_attributes_as_read() {
    let entity = counted_label().process_reading(
        attributes(json!({"count": "3", "label": "n"})),
        &LocaleContext::default(),
    );
    assert_eq!(entity.get("label"), Some(&Attribute::Value(json!("n=3"))));
    assert_eq!(entity.get_value("count"), Some(&json!(3)));
}

#[test]
fn process_reading_hooks_see_later_attributes_as_stored() {
    let entity = counted_label().process_reading(
        attributes(json!({"label": "n", "count": "3"})),
        &LocaleContext::default(),
    );
    assert_eq!(entity.get("label"), Some(&Attribute::Value(json!("n=\"3\""))));
    assert_eq!(entity.names().collect::<Vec<_>>(), vec!["label", "count"]);
}

#[test]
fn process_writing_hooks_see_earlier_attributes_as_written() {
    let columns = Columns::new()
        .with(Integer::new("count"))
        .with(Text::new("label").write(|value, attributes| {
            let counted = attributes.get("count").is_some_and(Value::is_number);
            Value::from(format!("{}:{}", value.as_str().unwrap_or_default(), counted))
        }));
    let locales = LocaleContext::default();
    let written = columns.process_writing(attributes(json!({"count": "7", "label": "x"})), &locales);
    assert_eq!(Value::Object(written), json!({"count": 7, "label": "x:true"}));
    let written = columns.process_writing(attributes(json!({"label": "x", "count": "7"})), &locales);
    assert_eq!(Value::Object(written), json!({"label": "x:false", "count": 7}));
}

#[test]
fn process_writing_keeps_unknown_attributes() {
    let columns = Columns::new().with(Text::new("foo"));
    let locales = LocaleContext::default();
    let written = columns.process_writing(attributes(json!({"foo": "a"})), &locales);
    assert_eq!(Value::Object(written), json!({"foo": "a"}));
    let written = columns.process_writing(attributes(json!({"foo": "a", "bar": "a"})), &locales);
    assert_eq!(Value::Object(written), json!({"foo": "a", "bar": "a"}));
}

#[test]
fn process_writing_appends_defaults() {
    let columns = Columns::new()
        .with(Text::new("foo"))
        .with(Text::new("bar").default_value("value"));
    let locales = LocaleContext::default();
    let written = columns.process_writing(attributes(json!({"foo": "a"})), &locales);
    assert_eq!(Value::Object(written), json!({"foo": "a", "bar": "value"}));
    let written = columns.process_writing(attributes(json!({"bar": "a"})), &locales);
    assert_eq!(Value::Object(written), json!({"bar": "a"}));
}

#[test]
fn process_writing_defaults_ignore_storability() {
    let columns = Columns::new()
        .with(Boolean::new("active").default_value(true).storable(false))
        .with(Text::new("note").default_value(Value::Null));
    let written = columns.process_writing(Attributes::new(), &LocaleContext::default());
    let keys: Vec<&String> = written.keys().collect();
    assert_eq!(keys, vec!["active", "note"]);
    assert_eq!(written.get("note"), Some(&Value::Null));
}

#[test]
fn process_writing_keeps_the_input_order() {
    let columns = Columns::new()
        .with(Text::new("a"))
        .with(Text::new("b"))
        .with(Text::new("c").default_value("z"));
    let written = columns.process_writing(attributes(json!({"b": 1, "a": 2})), &LocaleContext::default());
    assert_eq!(written.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    assert_eq!(written.get("b"), Some(&json!("1")));
}
