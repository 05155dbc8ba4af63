/// Property-based round trips for rich data.
///
/// Strategies generate value trees of scalars, versions, `default`, types
/// and nested arrays and hashes, with hash keys drawn from a pool that
/// includes the reserved `__ptype`/`__pvalue`/`__pref` keys. Types are taken
/// from the built-in singletons and a few parameterized forms, so the same
/// type handle often appears more than once in one tree.
///
/// Properties checked:
/// - `decode(encode(v)) == v` in rich-data mode, with and without
///   `type_by_reference` (which never emits a reference for these trees)
/// - the JSON reader yields the same tokens as the serializer, apart from
///   container size hints
/// - bare-data output never contains a reserved key the value did not
///   already have
use std::sync::Arc;

use indexmap::IndexMap;
use pcore::{Loader, SemVer, Type, TypeResolver, Value};
use proptest::prelude::*;
use rich_data::{decode, encode, json_to_data, Options, Serializer, Token, TokenRecorder};

// ============================================================================
// Strategies
// ============================================================================

fn arb_key() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-d]{1,3}",
        1 => prop::sample::select(vec!["__ptype", "__pvalue", "__pref"]).prop_map(String::from),
    ]
}

fn arb_type() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::string()),
        Just(Type::integer()),
        Just(Type::any()),
        (-3i64..3, 0i64..4).prop_map(|(min, len)| Type::integer_range(min, min + len)),
        Just(Type::optional_of(Type::string())),
        Just(Type::array_of(Type::boolean())),
    ]
}

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undef),
        Just(Value::Default),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::sample::select(vec![-2.5, 0.0, 0.1, 1.0, 1e21, 6.02e-23]).prop_map(Value::from),
        "[a-zA-Z0-9 \"\\\\/]{0,6}".prop_map(Value::from),
        (0u64..4, 0u64..4, 0u64..4).prop_map(|(a, b, c)| Value::SemVer(SemVer::new(a, b, c))),
        arb_type().prop_map(Value::Type),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::array),
            prop::collection::vec((arb_key(), inner), 0..4).prop_map(|entries| {
                let map: IndexMap<String, Value> = entries.into_iter().collect();
                Value::hash(map)
            }),
        ]
    })
}

fn resolver() -> (Arc<Loader>, Arc<dyn TypeResolver>) {
    let loader = Loader::new();
    let resolver: Arc<dyn TypeResolver> = loader.clone();
    (loader, resolver)
}

fn without_sizes(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|t| match t {
            Token::BeginArray(_) => Token::BeginArray(0),
            Token::BeginObject(_) => Token::BeginObject(0),
            other => other,
        })
        .collect()
}

fn has_reserved_key(v: &Value) -> bool {
    match v {
        Value::Array(a) => a.iter().any(has_reserved_key),
        Value::Hash(h) => {
            h.keys().any(|k| rich_data::consumer::is_reserved_key(k)) || h.values().any(has_reserved_key)
        }
        _ => false,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn rich_round_trip(v in arb_value()) {
        let (_loader, resolver) = resolver();
        let json = encode(&v, Options::default()).unwrap();
        let back = decode(&json, resolver).unwrap();
        prop_assert_eq!(&back, &v, "via {}", json);
    }

    #[test]
    fn rich_round_trip_without_type_references(v in arb_value()) {
        let (_loader, resolver) = resolver();
        let options = Options { type_by_reference: false, ..Options::default() };
        let json = encode(&v, options).unwrap();
        prop_assert!(!json.contains("{\"__pref\":"), "{}", json);
        let back = decode(&json, resolver).unwrap();
        prop_assert_eq!(&back, &v, "via {}", json);
    }

    #[test]
    fn reader_matches_serializer(v in arb_value()) {
        let mut direct = TokenRecorder::new();
        Serializer::default().convert(&v, &mut direct).unwrap();
        let json = encode(&v, Options::default()).unwrap();
        let mut parsed = TokenRecorder::new();
        json_to_data("<prop>", json.as_bytes(), &mut parsed).unwrap();
        prop_assert_eq!(
            without_sizes(parsed.into_tokens()),
            without_sizes(direct.into_tokens())
        );
    }

    #[test]
    fn bare_output_adds_no_reserved_keys(v in arb_value()) {
        let json = encode(&v, Options::bare()).unwrap();
        if !has_reserved_key(&v) {
            prop_assert!(!json.contains("\"__p"), "{}", json);
        }
    }
}
