use serde_json::{Value, json};
use strata::datatype::{CastKind, Type, is_numeric, to_int, to_string};

fn typed(type_name: &str) -> Type {
    Type::named(type_name)
}

#[test]
fn type_name_defaults_to_string() {
    assert_eq!(Type::new().type_name(), "string");
    assert_eq!(typed("text").type_name(), "text");
    assert!(Type::new().parameters().is_empty());
    assert!(!Type::new().has("type"));
}

#[test]
fn primary_types() {
    assert!(!Type::new().is_primary());
    assert!(!typed("text").is_primary());
    assert!(typed("primary").is_primary());
    assert!(typed("bigPrimary").is_primary());
}

#[test]
fn has_counts_null_defaults() {
    assert!(Type::new().with("default", "").has("default"));
    assert!(Type::new().with("default", Value::Null).has("default"));
    assert!(Type::new().with("default", 0).has("default"));
    assert_eq!(Type::new().get("type"), None);
    assert_eq!(Type::new().get_or("type", &json!("")), &json!(""));
}

#[test]
fn extend_keeps_the_type_name() {
    let mut column_type = typed("int");
    column_type.extend([("type", json!("text")), ("length", json!(11))]);
    assert_eq!(column_type.type_name(), "int");
    assert_eq!(column_type.get("length"), Some(&json!(11)));
}

#[test]
fn dispatch_table() {
    let expected = [
        ("primary", CastKind::Int),
        ("bigPrimary", CastKind::Int),
        ("int", CastKind::Int),
        ("tinyInt", CastKind::Int),
        ("bigInt", CastKind::Int),
        ("bool", CastKind::Bool),
        ("char", CastKind::String),
        ("string", CastKind::String),
        ("text", CastKind::String),
        ("double", CastKind::Float),
        ("float", CastKind::Float),
        ("decimal", CastKind::Float),
        ("datetime", CastKind::Datetime),
        ("date", CastKind::Date),
        ("time", CastKind::Time),
        ("timestamp", CastKind::Timestamp),
        ("json", CastKind::Array),
        ("array", CastKind::Array),
    ];
    for (type_name, kind) in expected {
        assert_eq!(CastKind::for_type(type_name), Some(kind), "{}", type_name);
    }
    assert_eq!(CastKind::for_type("uuid"), None);
}

#[test]
fn int_casts() {
    let int = typed("int");
    assert_eq!(int.cast(&json!(1)), json!(1));
    assert_eq!(int.cast(&json!("")), json!(0));
    assert_eq!(int.cast(&json!([])), json!(0));
    assert_eq!(int.cast_as(&json!([]), None, Some(&json!(1))), json!(1));
    assert_eq!(int.cast(&json!("12.7")), json!(12));
}

#[test]
fn float_casts() {
    let float = typed("float");
    assert_eq!(float.cast(&json!(1)), json!(1.0));
    assert_eq!(float.cast(&json!("")), json!(0.0));
    assert_eq!(float.cast(&json!([])), json!(0.0));
    assert_eq!(float.cast_as(&json!([]), None, Some(&json!(1))), json!(1.0));
}

#[test]
fn string_casts() {
    let string = typed("string");
    assert_eq!(string.cast(&json!("foo")), json!("foo"));
    assert_eq!(string.cast(&json!(1)), json!("1"));
    assert_eq!(string.cast(&json!([])), json!(""));
    assert_eq!(string.cast_as(&json!([]), None, Some(&json!("foo"))), json!("foo"));
}

#[test]
fn bool_casts() {
    let boolean = typed("bool");
    assert_eq!(boolean.cast(&json!(true)), json!(true));
    assert_eq!(boolean.cast(&json!(1)), json!(true));
    assert_eq!(boolean.cast(&json!([])), json!(false));
    assert_eq!(boolean.cast(&json!("string")), json!(true));
    assert_eq!(boolean.cast(&json!("0")), json!(false));
    assert_eq!(boolean.cast_as(&json!([]), None, Some(&json!(true))), json!(true));
}

#[test]
fn array_casts() {
    let array = typed("array");
    assert_eq!(array.cast(&json!(["foo"])), json!(["foo"]));
    assert_eq!(array.cast(&json!(1)), json!([]));
    assert_eq!(array.cast(&json!("foo")), json!([]));
    assert_eq!(array.cast_as(&json!("1"), None, Some(&json!(["foo"]))), json!(["foo"]));
    assert_eq!(array.cast(&json!("{\"a\":1}")), json!({"a": 1}));
}

#[test]
fn temporal_casts_only_ensure_strings() {
    for (type_name, sample) in [
        ("datetime", "2023-11-25 00:00:00"),
        ("date", "2023-11-25"),
        ("time", "10:09:08"),
        ("timestamp", "1272509157"),
    ] {
        let temporal = typed(type_name);
        assert_eq!(temporal.cast(&json!(sample)), json!(sample), "{}", type_name);
        assert_eq!(temporal.cast(&json!(1)), json!("1"), "{}", type_name);
        assert_eq!(temporal.cast(&json!([])), json!(""), "{}", type_name);
        assert_eq!(
            temporal.cast_as(&json!([]), None, Some(&json!(sample))),
            json!(sample),
            "{}",
            type_name
        );
    }
}

#[test]
fn cast_to_another_type() {
    let string = typed("string");
    assert_eq!(string.cast_as(&json!("foo"), Some("int"), None), json!(0));
    assert_eq!(string.cast_as(&json!(1), Some("int"), None), json!(1));
    assert_eq!(string.cast_as(&json!("foo"), Some("int"), Some(&json!(1))), json!(1));
}

#[test]
fn falsy_default_falls_back_to_the_default_parameter() {
    let int = typed("int").with("default", 5);
    assert_eq!(int.cast(&json!("x")), json!(5));
    assert_eq!(int.cast_as(&json!("x"), None, Some(&json!(0))), json!(5));
}

#[test]
fn unknown_types_leave_values_alone() {
    let odd = typed("uuid");
    assert_eq!(odd.cast(&json!({"a": [1]})), json!({"a": [1]}));
}

#[test]
fn casting_never_fails() {
    let inputs = [
        json!(null),
        json!(true),
        json!(false),
        json!(0),
        json!(-3.5),
        json!(""),
        json!("abc"),
        json!(" 42 "),
        json!([]),
        json!({}),
        json!([1, 2]),
        json!({"a": "b"}),
    ];
    for type_name in ["int", "float", "string", "bool", "json", "datetime"] {
        let column_type = typed(type_name);
        for input in &inputs {
            let cast = column_type.cast(input);
            let fits = match CastKind::for_type(type_name) {
                Some(CastKind::Int) => cast.is_i64(),
                Some(CastKind::Float) => cast.is_f64(),
                Some(CastKind::Bool) => cast.is_boolean(),
                Some(CastKind::Array) => cast.is_array() || cast.is_object(),
                _ => cast.is_string(),
            };
            assert!(fits, "{} cast of {} gave {}", type_name, input, cast);
        }
    }
}

#[test]
fn loose_scalars() {
    assert!(is_numeric(&json!(" 42 ")));
    assert!(is_numeric(&json!("1e3")));
    assert!(!is_numeric(&json!("42abc")));
    assert!(!is_numeric(&json!(true)));
    assert_eq!(to_int(&json!("42abc")), 42);
    assert_eq!(to_string(&json!(2.0)), "2");
    assert_eq!(to_string(&json!(true)), "1");
    assert_eq!(to_string(&json!(false)), "");
}
