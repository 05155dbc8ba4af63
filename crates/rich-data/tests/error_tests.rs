use pcore::issue;
use pcore::{PcoreError, Type, Value};
use pretty_assertions::assert_eq;
use rich_data::{RefTracker, RichDataError};

// ============================================================================
// Errors
// ============================================================================

#[test]
fn bad_data_message_names_root() {
    let err = RichDataError::BadData {
        path: None,
        pointer: String::new(),
        detail: "no value".to_string(),
    };
    assert_eq!(err.to_string(), "bad data at /: no value");
    assert_eq!(err.to_reported().message(), err.to_string());
}

#[test]
fn reported_keeps_source_location() {
    let err = RichDataError::BadData {
        path: Some("/tmp/sample.json".to_string()),
        pointer: "/0/type".to_string(),
        detail: "type 'Foo' not found".to_string(),
    };
    let reported = err.to_reported();
    assert_eq!(reported.code, issue::BAD_DATA);
    assert_eq!(
        reported.to_string(),
        "bad data at /0/type: type 'Foo' not found (/tmp/sample.json#/0/type)"
    );
}

#[test]
fn pcore_errors_keep_their_code() {
    let err = RichDataError::from(PcoreError::NotFound {
        name: "Foo".to_string(),
    });
    assert_eq!(err.issue_code(), issue::UNRESOLVED_TYPE);
    assert_eq!(err.to_reported().message(), "type 'Foo' not found");
}

// ============================================================================
// Reference tracker
// ============================================================================

#[test]
fn ids_start_at_one_and_follow_visit_order() {
    let mut t = RefTracker::new();
    let a = Value::Type(Type::integer_range(1, 2));
    let b = Value::Type(Type::integer_range(1, 2));
    assert_eq!(t.track(&a), (1, true));
    assert_eq!(t.track(&b), (2, true));
    assert_eq!(t.next_id(), 3);
    assert_eq!(t.track(&a), (1, false));
    assert_eq!(t.get(&b), Some(2));
    assert_eq!(t.len(), 3);
}

#[test]
fn identity_not_equality() {
    let mut t = RefTracker::new();
    let shared = Value::Type(Type::string());
    let again = Value::Type(Type::string());
    // String is a singleton, so both handles are the same value.
    assert_eq!(t.track(&shared), (1, true));
    assert_eq!(t.track(&again), (1, false));
    assert_eq!(t.track(&Value::from(1)), (2, true));
}
