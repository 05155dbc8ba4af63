use indexmap::IndexMap;
use pcore::issue::{ILLEGAL_ARGUMENT_TYPE, UNRESOLVED_TYPE};
use pcore::{Guard, Location, PcoreError, Reported, Severity};

// ============================================================================
// Issues
// ============================================================================

#[test]
fn format_substitutes_known_and_keeps_unknown() {
    let mut args = IndexMap::new();
    args.insert("type_name".to_string(), "Enum[]".to_string());
    args.insert("index".to_string(), "0".to_string());
    assert_eq!(
        ILLEGAL_ARGUMENT_TYPE.format(&args),
        "Enum[] expected argument 0 to be %{expected}, got %{actual}"
    );
}

#[test]
fn display_includes_location() {
    let mut args = IndexMap::new();
    args.insert("name".to_string(), "Foo".to_string());
    let r = Reported::new(
        UNRESOLVED_TYPE,
        Severity::Error,
        Some(Location::new(Some("/tmp/x.json"), "/0")),
        args,
    );
    assert_eq!(r.to_string(), "type 'Foo' not found (/tmp/x.json#/0)");
}

#[test]
fn error_maps_to_its_issue() {
    let err = PcoreError::NotFound {
        name: "Foo".to_string(),
    };
    assert_eq!(err.issue_code(), UNRESOLVED_TYPE);
    assert_eq!(err.to_reported(None).message(), err.to_string());
}

// ============================================================================
// Guard
// ============================================================================

#[test]
fn reentry_returns_seen_value() {
    let mut g = Guard::new();
    let r = g.with(1, 2, true, |g| g.with(1, 2, true, |_| false));
    assert!(r);
    assert!(g.is_empty());
}

#[test]
fn pairs_are_ordered() {
    let mut g = Guard::new();
    assert!(g.enter(1, 2));
    assert!(g.enter(2, 1));
    assert!(!g.enter(1, 2));
}
