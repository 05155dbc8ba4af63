//! The wire-neutral token stream.
//!
//! A value travels as a sequence of events: begin an array or a hash, add a
//! scalar, add a back-reference, end the innermost container. Hash entries
//! arrive as a key token (always a string) followed by the value's tokens.
//! Producers (the serializer, the JSON reader, [`replay`]) drive a
//! [`ValueConsumer`]; consumers (the JSON streamer, the collector, the
//! deserializer, [`TokenRecorder`]) turn the events into output.

use pcore::Value;

use crate::error::Result;

/// Key naming the type of a tagged hash.
pub const PTYPE_KEY: &str = "__ptype";
/// Key holding the opaque payload of a tagged hash.
pub const PVALUE_KEY: &str = "__pvalue";
/// Key of a back-reference to an earlier tagged value.
pub const PREF_KEY: &str = "__pref";

/// Whether `key` is one of the reserved rich-data keys.
pub fn is_reserved_key(key: &str) -> bool {
    key == PTYPE_KEY || key == PVALUE_KEY || key == PREF_KEY
}

pub trait ValueConsumer {
    /// Start an array. `len` is the element count when the producer knows
    /// it and only a capacity hint otherwise.
    fn begin_array(&mut self, len: usize) -> Result<()>;

    /// Start a hash of about `len` entries.
    fn begin_object(&mut self, len: usize) -> Result<()>;

    /// Add a scalar: undef, boolean, integer, float or string.
    fn add(&mut self, value: Value) -> Result<()>;

    /// Add a reference to the tagged value numbered `id`.
    fn add_ref(&mut self, id: usize) -> Result<()>;

    /// Close the innermost array or hash.
    fn end(&mut self) -> Result<()>;
}

/// One event of the token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    BeginArray(usize),
    BeginObject(usize),
    Add(Value),
    AddRef(usize),
    End,
}

/// A consumer that keeps the events it receives.
#[derive(Debug, Default)]
pub struct TokenRecorder {
    tokens: Vec<Token>,
}

impl TokenRecorder {
    pub fn new() -> Self {
        TokenRecorder::default()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }
}

impl ValueConsumer for TokenRecorder {
    fn begin_array(&mut self, len: usize) -> Result<()> {
        self.tokens.push(Token::BeginArray(len));
        Ok(())
    }

    fn begin_object(&mut self, len: usize) -> Result<()> {
        self.tokens.push(Token::BeginObject(len));
        Ok(())
    }

    fn add(&mut self, value: Value) -> Result<()> {
        self.tokens.push(Token::Add(value));
        Ok(())
    }

    fn add_ref(&mut self, id: usize) -> Result<()> {
        self.tokens.push(Token::AddRef(id));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.tokens.push(Token::End);
        Ok(())
    }
}

/// Feed recorded events to another consumer.
pub fn replay(tokens: &[Token], consumer: &mut dyn ValueConsumer) -> Result<()> {
    for token in tokens {
        match token {
            Token::BeginArray(len) => consumer.begin_array(*len)?,
            Token::BeginObject(len) => consumer.begin_object(*len)?,
            Token::Add(value) => consumer.add(value.clone())?,
            Token::AddRef(id) => consumer.add_ref(*id)?,
            Token::End => consumer.end()?,
        }
    }
    Ok(())
}
