use indexmap::IndexMap;
use pcore::{SemVer, Type, Value};

fn t(expr: &str) -> Type {
    expr.parse().unwrap()
}

fn hash(entries: &[(&str, Value)]) -> Value {
    Value::hash(
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<IndexMap<_, _>>(),
    )
}

// ============================================================================
// Optional and Enum
// ============================================================================

#[test]
fn optional_string_accepts_undef_and_strings() {
    let opt = t("Optional[String]");
    assert!(opt.accepts(&Value::Undef));
    assert!(opt.accepts(&Value::from("")));
    assert!(opt.accepts(&Value::from("anything")));
    assert!(!opt.accepts(&Value::from(1)));
}

#[test]
fn optional_constant_string() {
    let opt = t("Optional['x']");
    assert!(opt.accepts(&Value::from("x")));
    assert!(!opt.accepts(&Value::from("y")));
    assert!(opt.accepts(&Value::Undef));
}

#[test]
fn enum_instances_follow_case_rule() {
    let cs = t("Enum['a', 'B']");
    assert!(cs.accepts(&Value::from("B")));
    assert!(!cs.accepts(&Value::from("b")));

    let ci = t("Enum['a', 'B', true]");
    assert!(ci.accepts(&Value::from("b")));
    assert!(ci.accepts(&Value::from("A")));
    assert!(!ci.accepts(&Value::from("c")));
    assert!(!ci.accepts(&Value::from(1)));
}

#[test]
fn empty_enum_accepts_every_string() {
    assert!(Type::enumeration().accepts(&Value::from("whatever")));
    assert!(!Type::enumeration().accepts(&Value::Undef));
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn integer_and_float_are_distinct() {
    assert!(Type::integer().accepts(&Value::from(1)));
    assert!(!Type::integer().accepts(&Value::from(1.0)));
    assert!(Type::float().accepts(&Value::from(1.0)));
    assert!(!Type::float().accepts(&Value::from(1)));
    assert!(Type::numeric().accepts(&Value::from(1)));
    assert!(Type::numeric().accepts(&Value::from(1.5)));
}

#[test]
fn ranges_are_inclusive() {
    let r = t("Integer[1, 3]");
    assert!(r.accepts(&Value::from(1)));
    assert!(r.accepts(&Value::from(3)));
    assert!(!r.accepts(&Value::from(4)));
    let s = t("String[2, 3]");
    assert!(s.accepts(&Value::from("ab")));
    assert!(!s.accepts(&Value::from("a")));
    assert!(!s.accepts(&Value::from("abcd")));
}

#[test]
fn patterns_match_any_regex() {
    let p = t("Pattern['^a', 'z$']");
    assert!(p.accepts(&Value::from("abc")));
    assert!(p.accepts(&Value::from("xyz")));
    assert!(!p.accepts(&Value::from("mmm")));
}

#[test]
fn scalar_and_semver() {
    let v = Value::SemVer(SemVer::new(1, 0, 0));
    assert!(Type::semver().accepts(&v));
    assert!(Type::scalar().accepts(&v));
    assert!(!Type::scalar().accepts(&Value::Undef));
    assert!(!Type::scalar().accepts(&Value::array(vec![])));
    assert!(Type::default_type().accepts(&Value::Default));
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn arrays_check_size_and_elements() {
    let a = t("Array[Integer, 1, 2]");
    assert!(a.accepts(&Value::array(vec![Value::from(1)])));
    assert!(!a.accepts(&Value::array(vec![])));
    assert!(!a.accepts(&Value::array(vec![Value::from("x")])));
    assert!(t("Array[Integer]").accepts(&Value::array(vec![])));
}

#[test]
fn tuples_check_positions() {
    let tup = t("Tuple[Integer, String]");
    assert!(tup.accepts(&Value::array(vec![Value::from(1), Value::from("a")])));
    assert!(!tup.accepts(&Value::array(vec![Value::from("a"), Value::from(1)])));
    assert!(!tup.accepts(&Value::array(vec![Value::from(1)])));
}

#[test]
fn hashes_check_keys_and_values() {
    let h = t("Hash[Enum['a', 'b'], Integer]");
    assert!(h.accepts(&hash(&[("a", Value::from(1))])));
    assert!(!h.accepts(&hash(&[("c", Value::from(1))])));
    assert!(!h.accepts(&hash(&[("a", Value::from("x"))])));
}

#[test]
fn structs_allow_missing_optional_members_only() {
    let s = t("Struct[{'name' => String, 'port' => Optional[Integer]}]");
    assert!(s.accepts(&hash(&[("name", Value::from("web"))])));
    assert!(s.accepts(&hash(&[("name", Value::from("web")), ("port", Value::from(80))])));
    assert!(!s.accepts(&hash(&[("port", Value::from(80))])));
    assert!(!s.accepts(&hash(&[("name", Value::from("web")), ("extra", Value::from(1))])));
}

#[test]
fn type_values() {
    let tt = t("Type[Integer]");
    assert!(tt.accepts(&Value::Type(t("Integer[1, 2]"))));
    assert!(!tt.accepts(&Value::Type(Type::string())));
    assert!(!tt.accepts(&Value::from(1)));
}

// ============================================================================
// Inferred types
// ============================================================================

#[test]
fn ptype_is_most_specific() {
    assert_eq!(Value::from(3).ptype().to_string(), "Integer[3, 3]");
    assert_eq!(Value::from("x").ptype().to_string(), "String['x']");
    assert_eq!(
        Value::array(vec![Value::from(1), Value::from("a")]).ptype().to_string(),
        "Tuple[Integer[1, 1], String['a']]"
    );
    assert_eq!(
        hash(&[("a", Value::from(true))]).ptype().to_string(),
        "Struct[{'a' => Boolean}]"
    );
    assert_eq!(Value::array(vec![]).ptype().to_string(), "Array[Any, 0, 0]");
    assert_eq!(Value::Type(Type::string()).ptype().to_string(), "Type[String]");
}

#[test]
fn generic_widens() {
    assert_eq!(t("Integer[1, 2]").generic(), Type::integer());
    assert_eq!(t("Enum['a']").generic(), Type::enumeration());
    assert_eq!(
        t("Array[Integer[1, 2]]").generic().to_string(),
        "Array[Integer]"
    );
    assert_eq!(
        t("Optional[String['x']]").generic().to_string(),
        "Optional[String]"
    );
}
