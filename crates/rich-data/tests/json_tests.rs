use pcore::Value;
use pretty_assertions::assert_eq;
use rich_data::{json_to_data, replay, JsonStreamer, RichDataError, Token, TokenRecorder, ValueConsumer};

fn write(tokens: &[Token]) -> Result<String, RichDataError> {
    let mut streamer = JsonStreamer::new(Vec::new());
    replay(tokens, &mut streamer)?;
    Ok(String::from_utf8(streamer.into_inner()).unwrap())
}

fn read(json: &str) -> Result<Vec<Token>, RichDataError> {
    let mut recorder = TokenRecorder::new();
    json_to_data("input.json", json.as_bytes(), &mut recorder)?;
    Ok(recorder.into_tokens())
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn nested_containers_get_separators() {
    let json = write(&[
        Token::BeginObject(2),
        Token::Add(Value::from("a")),
        Token::BeginArray(3),
        Token::Add(Value::from(1)),
        Token::Add(Value::from(2.5)),
        Token::BeginArray(0),
        Token::End,
        Token::End,
        Token::Add(Value::from("b")),
        Token::BeginObject(0),
        Token::End,
        Token::End,
    ])
    .unwrap();
    assert_eq!(json, r#"{"a":[1,2.5,[]],"b":{}}"#);
}

#[test]
fn strings_are_escaped() {
    let json = write(&[Token::Add(Value::from("say \"hi\"\n\\"))]).unwrap();
    assert_eq!(json, r#""say \"hi\"\n\\""#);
}

#[test]
fn reference_is_written_inline() {
    let json = write(&[
        Token::BeginArray(2),
        Token::Add(Value::Undef),
        Token::AddRef(7),
        Token::End,
    ])
    .unwrap();
    assert_eq!(json, r#"[null,{"__pref":7}]"#);
}

#[test]
fn whole_floats_keep_their_fraction() {
    assert_eq!(write(&[Token::Add(Value::from(3.0))]).unwrap(), "3.0");
    assert_eq!(write(&[Token::Add(Value::from(-0.5))]).unwrap(), "-0.5");
}

#[test]
fn non_scalar_add_is_unsupported() {
    let err = write(&[Token::Add(Value::Default)]).unwrap_err();
    assert_eq!(err.to_string(), "unable to serialize value of type Default");
}

#[test]
fn keys_must_be_strings() {
    let err = write(&[Token::BeginObject(1), Token::Add(Value::from(1))]).unwrap_err();
    assert!(matches!(err, RichDataError::Unsupported { .. }));
    let err = write(&[Token::BeginObject(1), Token::AddRef(1)]).unwrap_err();
    assert!(matches!(err, RichDataError::Unsupported { .. }));
}

#[test]
fn flush_and_reuse_writer() {
    let mut streamer = JsonStreamer::new(Vec::new());
    streamer.begin_array(1).unwrap();
    streamer.add(Value::from(true)).unwrap();
    streamer.end().unwrap();
    streamer.flush().unwrap();
    assert_eq!(streamer.into_inner(), b"[true]");
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn reading_streams_tokens() {
    assert_eq!(
        read(r#"{"a":[1,-2,0.5,"s",true,null]}"#).unwrap(),
        vec![
            Token::BeginObject(0),
            Token::Add(Value::from("a")),
            Token::BeginArray(0),
            Token::Add(Value::from(1)),
            Token::Add(Value::from(-2)),
            Token::Add(Value::from(0.5)),
            Token::Add(Value::from("s")),
            Token::Add(Value::from(true)),
            Token::Add(Value::Undef),
            Token::End,
            Token::End,
        ]
    );
}

#[test]
fn pref_object_becomes_a_reference() {
    assert_eq!(
        read(r#"[{"__pref":2}]"#).unwrap(),
        vec![Token::BeginArray(0), Token::AddRef(2), Token::End]
    );
}

#[test]
fn pref_must_stand_alone() {
    let err = read(r#"{"__pref":2,"x":1}"#).unwrap_err();
    assert!(matches!(err, RichDataError::BadJson { .. }));
    assert!(err.to_string().contains("__pref must be the only key"), "{err}");
}

#[test]
fn syntax_error_is_bad_json_with_path() {
    let err = read(r#"{"a":}"#).unwrap_err();
    let RichDataError::BadJson { path, detail } = &err else {
        panic!("expected bad JSON, got {err:?}");
    };
    assert_eq!(path, "input.json");
    assert!(!detail.is_empty());
    assert!(err.to_string().starts_with("bad JSON in input.json: "));
}

#[test]
fn trailing_input_is_bad_json() {
    let err = read("[1] [2]").unwrap_err();
    assert!(matches!(err, RichDataError::BadJson { .. }));
}

#[test]
fn empty_input_is_bad_json() {
    assert!(matches!(read("").unwrap_err(), RichDataError::BadJson { .. }));
}

#[test]
fn out_of_range_number_is_bad_json() {
    assert!(matches!(read("1e999").unwrap_err(), RichDataError::BadJson { .. }));
}

/// Accepts containers, refuses every scalar.
struct NoScalars;

impl ValueConsumer for NoScalars {
    fn begin_array(&mut self, _len: usize) -> rich_data::Result<()> {
        Ok(())
    }

    fn begin_object(&mut self, _len: usize) -> rich_data::Result<()> {
        Ok(())
    }

    fn add(&mut self, value: Value) -> rich_data::Result<()> {
        Err(RichDataError::Unsupported {
            type_name: value.ptype().generic().to_string(),
        })
    }

    fn add_ref(&mut self, _id: usize) -> rich_data::Result<()> {
        Ok(())
    }

    fn end(&mut self) -> rich_data::Result<()> {
        Ok(())
    }
}

#[test]
fn consumer_error_is_returned_unchanged() {
    let err = json_to_data("input.json", "[true]".as_bytes(), &mut NoScalars).unwrap_err();
    assert_eq!(err.to_string(), "unable to serialize value of type Boolean");
    assert!(json_to_data("input.json", r#"[{"__pref":1}]"#.as_bytes(), &mut NoScalars).is_ok());
}
