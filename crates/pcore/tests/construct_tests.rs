use std::sync::Arc;

use indexmap::IndexMap;
use pcore::issue;
use pcore::{
    parameterized, ConstructArgs, Loader, PcoreError, SemVer, Type, TypeResolver, Value,
};

fn strings(values: &[&str]) -> Vec<Value> {
    values.iter().map(|s| Value::from(*s)).collect()
}

fn resolver() -> Arc<dyn TypeResolver> {
    Loader::new()
}

// ============================================================================
// Illegal arguments
// ============================================================================

#[test]
fn enum_rejects_non_string_single_argument() {
    let err = parameterized("Enum", &[Value::from(1)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Enum[] expected argument 0 to be String or Array[String], got 1"
    );
    assert!(matches!(
        err,
        PcoreError::IllegalArgumentType { index: 0, .. }
    ));
}

#[test]
fn enum_rejects_non_string_later_argument() {
    let err = parameterized("Enum", &[Value::from("a"), Value::from(2), Value::from("c")]).unwrap_err();
    assert_eq!(err.to_string(), "Enum[] expected argument 1 to be String, got 2");
}

#[test]
fn enum_boolean_only_allowed_last() {
    let err = parameterized("Enum", &[Value::from("a"), Value::from(true), Value::from("c")])
        .unwrap_err();
    assert_eq!(err.to_string(), "Enum[] expected argument 1 to be String, got true");
}

#[test]
fn optional_argument_rules() {
    let err = parameterized("Optional", &[Value::from(1)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Optional[] expected argument 0 to be Variant[Type,String], got 1"
    );
    let err = parameterized(
        "Optional",
        &[Value::Type(Type::string()), Value::Type(Type::integer())],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Optional[] expects 0 - 1 arguments, got 2");
}

#[test]
fn arity_errors() {
    let err = parameterized("Hash", &[Value::Type(Type::string())]).unwrap_err();
    assert_eq!(err.to_string(), "Hash[] expects 0, 2 - 4 arguments, got 1");
    let err = parameterized("Boolean", &[Value::from(1)]).unwrap_err();
    assert_eq!(err.to_string(), "Boolean[] expects 0 arguments, got 1");
}

#[test]
fn inverted_range_is_rejected() {
    let err = parameterized("Integer", &[Value::from(5), Value::from(1)]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Integer[] expected argument 1 to be Integer >= 5, got 1"
    );
}

#[test]
fn invalid_pattern() {
    let err = parameterized("Pattern", &strings(&["("])).unwrap_err();
    assert!(matches!(err, PcoreError::InvalidPattern { .. }));
}

#[test]
fn illegal_argument_reports_structured_issue() {
    let err = parameterized("Enum", &[Value::from(1)]).unwrap_err();
    let reported = err.to_reported(None);
    assert_eq!(reported.code, issue::ILLEGAL_ARGUMENT_TYPE);
    assert_eq!(reported.args["type_name"], "Enum[]");
    assert_eq!(reported.args["index"], "0");
    assert_eq!(reported.args["expected"], "String or Array[String]");
    assert_eq!(reported.args["actual"], "1");
    assert_eq!(reported.message(), err.to_string());
}

// ============================================================================
// Argument forms
// ============================================================================

#[test]
fn enum_argument_forms() {
    let a = parameterized("Enum", &strings(&["a", "b"])).unwrap();
    let b = parameterized("Enum", &[Value::array(strings(&["a", "b"]))]).unwrap();
    assert_eq!(a, b);

    let ci = parameterized(
        "Enum",
        &[Value::array(strings(&["A", "b"])), Value::from(true)],
    )
    .unwrap();
    assert_eq!(ci.to_string(), "Enum['a', 'b', true]");

    assert!(parameterized("Enum", &[]).unwrap().ptr_eq(&Type::enumeration()));
}

#[test]
fn optional_string_argument_is_constant() {
    let t = parameterized("Optional", &strings(&["x"])).unwrap();
    assert_eq!(t.to_string(), "Optional['x']");
    assert!(t.accepts(&Value::from("x")));
    assert!(!t.accepts(&Value::from("y")));
}

#[test]
fn defaults_are_singletons() {
    assert!(parameterized("String", &[]).unwrap().ptr_eq(&Type::string()));
    assert!(parameterized("Integer", &[Value::Default, Value::Default])
        .unwrap()
        .ptr_eq(&Type::integer()));
    assert!(parameterized("Array", &[Value::Type(Type::any())])
        .unwrap()
        .ptr_eq(&Type::array()));
}

#[test]
fn parameters_rebuild_the_type() {
    for expr in [
        "Integer[1, 10]",
        "Float[default, 2.5]",
        "String[1]",
        "Enum['x', 'y', true]",
        "Array[String, 1, 2]",
        "Hash[String, Integer, 0, 3]",
        "Struct[{'a' => Integer}]",
        "Variant[Integer, String]",
    ] {
        let t: Type = expr.parse().unwrap();
        let rebuilt = parameterized(t.name(), &t.parameters()).unwrap();
        assert_eq!(rebuilt, t, "{expr}");
    }
}

// ============================================================================
// Creating values from types
// ============================================================================

#[test]
fn semver_from_payload() {
    let v = Type::semver()
        .construct(ConstructArgs::Payload(Value::from("1.0.0")), &resolver())
        .unwrap();
    assert_eq!(v, Value::SemVer(SemVer::new(1, 0, 0)));
}

#[test]
fn type_from_payload() {
    let v = Type::type_type()
        .construct(ConstructArgs::Payload(Value::from("Integer[1, 2]")), &resolver())
        .unwrap();
    assert_eq!(v, Value::Type(Type::integer_range(1, 2)));
}

#[test]
fn object_type_from_init_hash() {
    let mut attrs = IndexMap::new();
    attrs.insert("x".to_string(), Value::Type(Type::integer()));
    let mut init = IndexMap::new();
    init.insert("name".to_string(), Value::from("Point"));
    init.insert("attributes".to_string(), Value::hash(attrs));
    let v = Type::meta_object()
        .construct(ConstructArgs::Hash(init), &resolver())
        .unwrap();
    let t = v.as_type().unwrap();
    assert_eq!(t.name(), "Point");
    assert_eq!(t.as_object().unwrap().all_attributes().len(), 1);
}

#[test]
fn hash_from_flat_payload() {
    let v = Type::hash()
        .construct(
            ConstructArgs::Payload(Value::array(vec![
                Value::from("__ptype"),
                Value::from(1),
                Value::from("b"),
                Value::from(2),
            ])),
            &resolver(),
        )
        .unwrap();
    let Value::Hash(h) = v else {
        panic!("expected a hash")
    };
    assert_eq!(h.get("__ptype"), Some(&Value::from(1)));
    assert_eq!(h.len(), 2);
}

#[test]
fn default_from_empty_hash() {
    let v = Type::default_type()
        .construct(ConstructArgs::Hash(IndexMap::new()), &resolver())
        .unwrap();
    assert_eq!(v, Value::Default);
}

#[test]
fn no_constructor_for_mismatched_input() {
    let err = Type::integer()
        .construct(ConstructArgs::Payload(Value::from("x")), &resolver())
        .unwrap_err();
    assert!(matches!(err, PcoreError::NoConstructor { .. }));
    let err = Type::semver()
        .construct(ConstructArgs::Payload(Value::from("one")), &resolver())
        .unwrap_err();
    assert_eq!(err, PcoreError::InvalidSemVer("one".to_string()));
}
