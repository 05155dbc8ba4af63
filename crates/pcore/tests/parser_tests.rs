use pcore::{Attribute, Loader, ObjectType, PcoreError, Type, TypeKind};

fn roundtrip(expr: &str) {
    let t: Type = expr.parse().unwrap();
    assert_eq!(t.to_string(), expr, "display of {expr}");
    let again: Type = t.to_string().parse().unwrap();
    assert_eq!(again, t, "reparse of {expr}");
}

// ============================================================================
// Canonical form
// ============================================================================

#[test]
fn unparameterized_names() {
    for name in [
        "Any", "Undef", "Default", "Scalar", "Boolean", "Numeric", "Integer", "Float", "String",
        "Pattern", "Enum", "Optional", "Variant", "Array", "Hash", "Tuple", "Struct", "Type",
        "SemVer", "Object", "TypeSet",
    ] {
        roundtrip(name);
    }
}

#[test]
fn builtins_are_singletons() {
    let a: Type = "String".parse().unwrap();
    let b: Type = "String".parse().unwrap();
    assert!(a.ptr_eq(&b));
    assert!(a.ptr_eq(&Type::string()));
}

#[test]
fn parameterized_forms() {
    for expr in [
        "Integer[1, 10]",
        "Integer[1]",
        "Integer[default, 10]",
        "Float[1.5, 2.0]",
        "String[1, 5]",
        "String['x']",
        "Enum['a', 'b']",
        "Enum['a', 'b', true]",
        "Pattern['^a+$']",
        "Optional[Integer]",
        "Optional['x']",
        "Variant[Integer, String]",
        "Array[String]",
        "Array[String, 1, 2]",
        "Array[Any, 1, 2]",
        "Hash[String, Integer]",
        "Hash[String, Integer, 1, default]",
        "Tuple[Integer, String]",
        "Struct[{'a' => Integer, 'b' => Optional[String]}]",
        "Type[Integer]",
        "Type[Optional[Array[Integer]]]",
    ] {
        roundtrip(expr);
    }
}

#[test]
fn quoted_strings_escape() {
    roundtrip(r"String['it\'s']");
    roundtrip(r"Enum['back\\slash']");
    let t: Type = r#"Enum["double"]"#.parse().unwrap();
    assert_eq!(t.to_string(), "Enum['double']");
}

#[test]
fn whitespace_and_trailing_commas() {
    let t: Type = " Array[ String ,1, ] ".parse().unwrap();
    assert_eq!(t.to_string(), "Array[String, 1, default]");
    let t: Type = "Struct[{ a => Integer, }]".parse().unwrap();
    assert_eq!(t.to_string(), "Struct[{'a' => Integer}]");
}

#[test]
fn anonymous_object_type() {
    roundtrip("Object[{attributes => {'x' => Integer, 'y' => {'type' => Integer, 'value' => 0}}}]");
}

#[test]
fn named_object_type_displays_its_name() {
    let t: Type = "Object[{name => 'Point', attributes => {'x' => Integer}}]"
        .parse()
        .unwrap();
    assert_eq!(t.to_string(), "Point");
    assert_eq!(t.name(), "Point");
}

#[test]
fn type_set_definition_roundtrip() {
    let expr = "TypeSet[{pcore_version => '1.0.0', \
        name_authority => 'http://puppet.com/2016.1/runtime', \
        name => 'Net', version => '2.1.0', \
        types => {Host => {attributes => {'name' => String, 'ports' => Array[Port]}}, \
        Port => {attributes => {'number' => Integer[0, 65535]}}}}]";
    roundtrip(expr);
}

// ============================================================================
// Names and resolution
// ============================================================================

#[test]
fn unknown_names_are_references() {
    let t: Type = "Foo::Bar".parse().unwrap();
    match t.kind() {
        TypeKind::Reference(r) => {
            assert_eq!(r.name(), "Foo::Bar");
            assert!(!r.is_resolved());
        }
        _ => panic!("expected a reference"),
    }
    assert_eq!(t.to_string(), "Foo::Bar");
}

#[test]
fn loader_resolves_references_lazily() {
    let loader = Loader::new();
    let t = loader.parse_type("Optional[Point]").unwrap();
    let point = Type::new(TypeKind::Object(ObjectType::new(
        "Point",
        None,
        vec![Attribute::new("x", Type::integer())],
    )));
    // Registered after parsing; the reference is resolved on first use.
    loader.add_type(point.clone()).unwrap();
    match t.kind() {
        TypeKind::Optional(inner) => assert!(inner.deref().ptr_eq(&point)),
        _ => panic!("expected an optional"),
    }
}

#[test]
fn meta_type_names() {
    let t: Type = "Pcore::ObjectType".parse().unwrap();
    assert!(t.ptr_eq(&Type::meta_object()));
    let t: Type = "Pcore::TypeSet".parse().unwrap();
    assert!(t.ptr_eq(&Type::meta_type_set()));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn syntax_errors_carry_offset() {
    for bad in ["Array[", "Integer[1", "Integer]", "", "Hash[{'a' 1}]", "'x'"] {
        let err = bad.parse::<Type>().unwrap_err();
        assert!(matches!(err, PcoreError::Parse { .. }), "{bad}: {err}");
    }
    let err = "Integer]".parse::<Type>().unwrap_err();
    assert!(matches!(err, PcoreError::Parse { offset: 7, .. }));
}

#[test]
fn parameters_on_unknown_names_fail() {
    let err = "Foo[1]".parse::<Type>().unwrap_err();
    assert_eq!(
        err.to_string(),
        "syntax error in type expression at offset 0: 'Foo' does not take parameters (in 'Foo[1]')"
    );
}

#[test]
fn constructor_errors_pass_through() {
    let err = "Enum[1]".parse::<Type>().unwrap_err();
    assert_eq!(
        err.to_string(),
        "Enum[] expected argument 0 to be String or Array[String], got 1"
    );
}

#[test]
fn nesting_depth_is_bounded() {
    let nested = |depth: usize| format!("{}String{}", "Array[".repeat(depth), "]".repeat(depth));
    assert!(nested(100).parse::<Type>().is_ok());

    let err = nested(5000).parse::<Type>().unwrap_err();
    assert!(
        matches!(&err, PcoreError::Parse { message, .. } if message == "type expression nested too deeply"),
        "unexpected error kind"
    );
    let err = format!("{}]", "[".repeat(500)).parse::<Type>().unwrap_err();
    assert!(matches!(err, PcoreError::Parse { .. }));
}
