//! # Schema Agreement Tests
//!
//! A form's derived schema, compiled with `jsonschema`, must accept exactly
//! the documents that the form's own `validate_data` accepts. These tests
//! drive both with hand-picked documents and with generated ones.

use formless_core::{Constraint, DeserializationError};
use formless_form::{BasicField, BasicForm, Converter, Fields, Form, Nullable};
use formless_schema::{audit_closed_objects, check_agreement, SchemaCheckError, SchemaChecker};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
struct Address {
    city: String,
    zip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct Member {
    name: String,
    age: i64,
    active: bool,
    address: Address,
    nickname: Option<String>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn address_form() -> BasicForm<Address> {
    BasicForm::builder("address", |mut fields: Fields| {
        Ok(Address {
            city: fields.take("city")?,
            zip: fields.take_optional::<Option<String>>("zip")?.flatten(),
        })
    })
    .child(BasicField::text("city").build().unwrap(), |a: &Address| &a.city)
    .child(
        Nullable::new(BasicField::text("zip").optional().build().unwrap()),
        |a: &Address| &a.zip,
    )
    .build()
    .unwrap()
}

fn member_form() -> BasicForm<Member> {
    BasicForm::builder("member", |mut fields: Fields| {
        Ok(Member {
            name: fields.take("name")?,
            age: fields.take("age")?,
            active: fields.take("active")?,
            address: fields.take("address")?,
            nickname: fields.take_optional::<Option<String>>("nickname")?.flatten(),
        })
    })
    .description("A club member")
    .child(
        BasicField::text("name")
            .data_constraint(Constraint::new("must not be empty", |v: &Value| {
                v.as_str().is_some_and(|s| !s.is_empty())
            }))
            .schema_keyword("minLength", json!(1))
            .build()
            .unwrap(),
        |m: &Member| &m.name,
    )
    .child(
        BasicField::integer("age").optional().default(18).build().unwrap(),
        |m: &Member| &m.age,
    )
    .child(
        BasicField::boolean("active").optional().default(true).build().unwrap(),
        |m: &Member| &m.active,
    )
    .child(address_form(), |m: &Member| &m.address)
    .child(
        Nullable::new(BasicField::text("nickname").optional().build().unwrap()),
        |m: &Member| &m.nickname,
    )
    .build()
    .unwrap()
}

#[test]
fn test_derived_schema_compiles() {
    init_tracing();
    let checker = SchemaChecker::for_form(&member_form()).expect("schema compiles");
    assert_eq!(checker.schema_name(), "Member");
    assert_eq!(checker.schema()["description"], json!("A club member"));
}

#[test]
fn test_serialized_objects_conform() {
    let form = member_form();
    let checker = SchemaChecker::for_form(&form).unwrap();
    let member = Member {
        name: "Ann".to_string(),
        age: 40,
        active: false,
        address: Address {
            city: "Springfield".to_string(),
            zip: None,
        },
        nickname: Some("Annie".to_string()),
    };
    let data = form.serialize(&member);
    checker.validate_document(&data).expect("serialized member conforms");
    assert!(form.validate_data(&data).satisfied());
    assert_eq!(form.deserialize_root(&data), Ok(member));
}

#[test]
fn test_schema_violations_match_form_errors() {
    let form = member_form();
    let checker = SchemaChecker::for_form(&form).unwrap();
    let data = json!({"name": "", "age": "x", "address": {}});

    let err = checker.validate_document(&data).unwrap_err();
    let SchemaCheckError::ValidationFailed { report: schema_report, .. } = err else {
        panic!("expected a validation failure");
    };
    assert_eq!(schema_report.pointers(), vec!["/address", "/age", "/name"]);

    let report = form.deserialize_root(&data).unwrap_err();
    let report_paths: Vec<String> = report.paths().map(|p| p.to_pointer()).collect();
    assert_eq!(report_paths, vec!["/address/city", "/age", "/name"]);
    assert_eq!(
        report.get(&["address", "city"].into()),
        Some(&DeserializationError::Missing)
    );
}

#[test]
fn test_agreement_on_hand_picked_documents() {
    init_tracing();
    let form = member_form();
    let documents = [
        json!({"name": "Ann", "address": {"city": "X"}}),
        json!({"name": "Ann", "address": {"city": "X", "zip": null}, "nickname": null}),
        json!({"name": "Ann", "address": {"city": "X"}, "unknown": 1}),
        json!({"name": "", "address": {"city": "X"}}),
        json!({"name": "Ann"}),
        json!({"name": "Ann", "address": null}),
        json!({"name": "Ann", "address": {"city": 3}}),
        json!({"name": "Ann", "address": {"city": "X"}, "active": "yes"}),
        json!({"name": null, "address": {"city": "X"}}),
        json!({"name": "Ann", "address": {"city": "X"}, "age": i64::MAX}),
        json!({"name": "Ann", "address": {"city": "X"}, "age": 9_223_372_036_854_775_808u64}),
        json!({"name": "Ann", "address": {"city": "X"}, "age": 18.5}),
        json!("Ann"),
        Value::Null,
    ];
    for document in &documents {
        let agreement = check_agreement(&form, document).unwrap();
        assert!(agreement.agrees(), "disagreement on {document}: {agreement:?}");
    }
}

#[test]
fn test_age_beyond_i64_rejected_everywhere() {
    let form = member_form();
    let checker = SchemaChecker::for_form(&form).unwrap();
    let data = json!({"name": "Ann", "address": {"city": "X"}, "age": u64::MAX});

    let err = checker.validate_document(&data).unwrap_err();
    let SchemaCheckError::ValidationFailed { report, .. } = err else {
        panic!("expected a validation failure");
    };
    assert_eq!(report.pointers(), vec!["/age"]);
    assert_eq!(report.at("/age")[0].schema_path, "/properties/age/maximum");
    assert!(!form.validate_data(&data).satisfied());
    assert!(matches!(
        form.deserialize_root(&data)
            .unwrap_err()
            .get(&["age"].into()),
        Some(DeserializationError::Constraint(_))
    ));
}

#[test]
fn test_derived_schemas_are_closed() {
    let schema = member_form().data_schema();
    assert!(audit_closed_objects(&schema).is_empty());

    let mut opened = schema.clone();
    if let Some(Value::Object(address)) = opened.pointer_mut("/properties/address") {
        address.remove("unevaluatedProperties");
    }
    let findings = audit_closed_objects(&opened);
    assert_eq!(findings.len(), 1);
    assert_eq!(
        findings[0].json_path,
        "/properties/address/unevaluatedProperties"
    );
}

fn arb_leaf() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        any::<bool>().prop_map(|b| Some(json!(b))),
        any::<i64>().prop_map(|n| Some(json!(n))),
        any::<u64>().prop_map(|n| Some(json!(n))),
        (-1000i32..1000).prop_map(|n| Some(json!(f64::from(n) + 0.5))),
        "[a-z]{0,3}".prop_map(|s| Some(json!(s))),
    ]
}

fn arb_address() -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        arb_leaf(),
        (arb_leaf(), arb_leaf()).prop_map(|(city, zip)| {
            let mut map = Map::new();
            if let Some(city) = city {
                map.insert("city".to_string(), city);
            }
            if let Some(zip) = zip {
                map.insert("zip".to_string(), zip);
            }
            Some(Value::Object(map))
        }),
    ]
}

fn arb_member_document() -> impl Strategy<Value = Value> {
    (
        arb_leaf(),
        arb_leaf(),
        arb_leaf(),
        arb_address(),
        arb_leaf(),
        arb_leaf(),
    )
        .prop_map(|(name, age, active, address, nickname, extra)| {
            let mut map = Map::new();
            for (key, value) in [
                ("name", name),
                ("age", age),
                ("active", active),
                ("address", address),
                ("nickname", nickname),
                ("extra", extra),
            ] {
                if let Some(value) = value {
                    map.insert(key.to_string(), value);
                }
            }
            Value::Object(map)
        })
}

proptest! {
    /// The compiled schema and `validate_data` agree on every generated
    /// document, and a document that passes both also deserializes.
    #[test]
    fn schema_and_constraints_agree(document in arb_member_document()) {
        let form = member_form();
        let checker = SchemaChecker::for_form(&form).unwrap();
        let agreement = checker.agreement(&form, &document);
        prop_assert!(agreement.agrees(), "disagreement on {}: {:?}", document, agreement);
        if agreement.schema_valid {
            prop_assert!(form.deserialize_root(&document).is_ok());
        }
    }
}
