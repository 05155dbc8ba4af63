/// Property-based tests for the type lattice.
///
/// Strategies generate random types built from the scalar kinds and the
/// collection constructors, and random data values (no objects, no types).
/// The properties checked:
/// - the canonical string of a type parses back to an equal type
/// - every type is assignable to itself and to its reparsed copy
/// - a value is an instance of a type exactly when its inferred type is
///   assignable to that type
///
/// Values never carry undef inside a hash: a struct member whose type
/// accepts undef is optional, so `{'a' => undef}` and `{}` infer types that
/// are not interchangeable.
use indexmap::IndexMap;
use pcore::{SemVer, Type, Value};
use proptest::prelude::*;
use regex::Regex;

// ============================================================================
// Strategies for generating types
// ============================================================================

fn arb_literal() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-cA-C]{1,3}").unwrap()
}

fn arb_size() -> impl Strategy<Value = (usize, usize)> {
    prop_oneof![
        (0usize..3, 0usize..3).prop_map(|(a, b)| (a.min(b), a.max(b))),
        (0usize..3).prop_map(|a| (a, usize::MAX)),
    ]
}

fn arb_leaf_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::any()),
        Just(Type::undef()),
        Just(Type::boolean()),
        Just(Type::numeric()),
        Just(Type::scalar()),
        Just(Type::semver()),
        (-5i64..5, -5i64..5).prop_map(|(a, b)| Type::integer_range(a.min(b), a.max(b))),
        prop::sample::select(vec![(-1.5, 0.0), (0.0, 2.25), (0.5, 0.5)])
            .prop_map(|(a, b)| Type::float_range(a, b)),
        arb_size().prop_map(|(min, max)| Type::string_sized(min, max)),
        arb_literal().prop_map(Type::constant_string),
        (prop::collection::vec(arb_literal(), 1..3), any::<bool>())
            .prop_map(|(values, ci)| Type::enumeration_of(values, ci)),
        prop::sample::select(vec!["^a", "b$", "^[abc]+$"])
            .prop_map(|p| Type::pattern_of(vec![Regex::new(p).unwrap()])),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    arb_leaf_type().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Type::optional_of),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Type::variant_of),
            (inner.clone(), arb_size())
                .prop_map(|(t, (min, max))| Type::array_sized(t, min, max)),
            (inner.clone(), inner.clone(), arb_size())
                .prop_map(|(k, v, (min, max))| Type::hash_sized(k, v, min, max)),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Type::tuple_of),
            prop::collection::btree_map("[a-c]", inner.clone(), 1..3).prop_map(Type::struct_of),
            inner.prop_map(Type::type_of),
        ]
    })
}

// ============================================================================
// Strategies for generating values
// ============================================================================

fn arb_leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undef),
        any::<bool>().prop_map(Value::from),
        (-6i64..6).prop_map(Value::from),
        prop::sample::select(vec![-1.5, 0.0, 0.5, 2.25, 3.0]).prop_map(Value::from),
        "[a-cA-C]{0,4}".prop_map(Value::from),
        (0u64..3, 0u64..3).prop_map(|(a, b)| Value::SemVer(SemVer::new(a, b, 0))),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf_value().prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::array),
            prop::collection::vec(("[a-c]", inner), 0..3).prop_map(|entries| {
                let map: IndexMap<String, Value> = entries
                    .into_iter()
                    .map(|(k, v)| if v.is_undef() { (k, Value::from(0)) } else { (k, v) })
                    .collect();
                Value::hash(map)
            }),
        ]
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn canonical_string_reparses_equal(t in arb_type()) {
        let text = t.to_string();
        let again: Type = text.parse().unwrap();
        prop_assert_eq!(&again, &t, "reparse of {}", text);
        prop_assert_eq!(again.to_string(), text);
    }

    #[test]
    fn assignability_is_reflexive(t in arb_type()) {
        let again: Type = t.to_string().parse().unwrap();
        prop_assert!(t.accepts_type(&t));
        prop_assert!(t.accepts_type(&again), "{} from its copy", t);
        prop_assert!(again.accepts_type(&t), "copy from {}", t);
    }

    #[test]
    fn instance_agrees_with_inferred_type(t in arb_type(), v in arb_value()) {
        let inferred = v.ptype();
        prop_assert_eq!(
            t.accepts(&v),
            t.accepts_type(&inferred),
            "{} against {} (inferred {})", t, v, inferred
        );
    }

    #[test]
    fn any_accepts_everything(t in arb_type(), v in arb_value()) {
        prop_assert!(Type::any().accepts_type(&t));
        prop_assert!(Type::any().accepts(&v));
    }
}
