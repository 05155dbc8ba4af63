//! Parser for the canonical string form of types.
//!
//! Accepts what `Display` on [`Type`] produces: qualified type names,
//! bracketed argument lists, quoted strings, numbers, `true`/`false`,
//! `undef`, `default`, arrays, and hashes written with `=>`. Hash keys may
//! be bare words. Names that are not built-in become lazily resolved
//! references.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use crate::construct::parameterized;
use crate::error::{PcoreError, Result};
use crate::loader::TypeResolver;
use crate::reference::TypeReference;
use crate::types::{Type, TypeKind};
use crate::value::Value;

/// Deepest nesting of brackets, arrays and hashes the parser accepts.
pub const MAX_DEPTH: usize = 128;

/// Parse a type expression. Names that are not built-in are resolved
/// through `resolver` on first use.
pub fn parse_type(expr: &str, resolver: Option<Weak<dyn TypeResolver>>) -> Result<Type> {
    let mut parser = Parser {
        expr,
        pos: 0,
        depth: 0,
        resolver,
    };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < expr.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    match value {
        Value::Type(t) => Ok(t),
        other => Err(parser.error(&format!("expected a type, got {}", other))),
    }
}

struct Parser<'a> {
    expr: &'a str,
    pos: usize,
    depth: usize,
    resolver: Option<Weak<dyn TypeResolver>>,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> PcoreError {
        PcoreError::Parse {
            expr: self.expr.to_string(),
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        let expr = self.expr;
        &expr[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.expr.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", token)))
        }
    }

    fn value(&mut self) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("type expression nested too deeply"));
        }
        self.depth += 1;
        let value = self.term();
        self.depth -= 1;
        value
    }

    fn term(&mut self) -> Result<Value> {
        self.skip_ws();
        match self.peek() {
            Some('\'') | Some('"') => self.quoted().map(Value::String),
            Some('[') => {
                self.pos += 1;
                let elements = self.list("]")?;
                Ok(Value::array(elements))
            }
            Some('{') => self.hash(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_uppercase() => self.type_expr().map(Value::Type),
            Some(c) if c.is_ascii_lowercase() || c == '_' => {
                let word = self.word();
                Ok(match word {
                    "true" => Value::Boolean(true),
                    "false" => Value::Boolean(false),
                    "undef" => Value::Undef,
                    "default" => Value::Default,
                    other => Value::String(other.to_string()),
                })
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Comma separated values up to `close`. A trailing comma is allowed.
    fn list(&mut self, close: &str) -> Result<Vec<Value>> {
        let mut values = Vec::new();
        if self.eat(close) {
            return Ok(values);
        }
        loop {
            values.push(self.value()?);
            if self.eat(",") {
                if self.eat(close) {
                    return Ok(values);
                }
                continue;
            }
            self.expect(close)?;
            return Ok(values);
        }
    }

    fn hash(&mut self) -> Result<Value> {
        self.expect("{")?;
        let mut entries = IndexMap::new();
        if self.eat("}") {
            return Ok(Value::hash(entries));
        }
        loop {
            self.skip_ws();
            let key = match self.peek() {
                Some('\'') | Some('"') => self.quoted()?,
                Some(c) if c.is_ascii_alphabetic() || c == '_' => self.qualified_name().to_string(),
                _ => return Err(self.error("expected a hash key")),
            };
            self.expect("=>")?;
            let value = self.value()?;
            entries.insert(key, value);
            if self.eat(",") {
                if self.eat("}") {
                    break;
                }
                continue;
            }
            self.expect("}")?;
            break;
        }
        Ok(Value::hash(entries))
    }

    fn type_expr(&mut self) -> Result<Type> {
        let start = self.pos;
        let name = self.qualified_name();
        let after_name = self.pos;
        if self.eat("[") {
            let args = self.list("]")?;
            return parameterized(name, &args).map_err(|e| match e {
                PcoreError::NotFound { .. } => {
                    self.pos = start;
                    self.error(&format!("'{}' does not take parameters", name))
                }
                other => other,
            });
        }
        self.pos = after_name;
        if let Some(t) = Type::builtin(name) {
            return Ok(t);
        }
        Ok(Type::new(TypeKind::Reference(TypeReference::new(
            name,
            self.resolver.clone(),
        ))))
    }

    fn word(&mut self) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.rest().len());
        self.pos += len;
        let expr = self.expr;
        &expr[start..self.pos]
    }

    /// A word optionally followed by `::word` segments.
    fn qualified_name(&mut self) -> &'a str {
        let start = self.pos;
        self.word();
        while self.rest().starts_with("::")
            && self.rest()[2..].starts_with(|c: char| c.is_ascii_alphabetic())
        {
            self.pos += 2;
            self.word();
        }
        let expr = self.expr;
        &expr[start..self.pos]
    }

    fn quoted(&mut self) -> Result<String> {
        let Some(quote) = self.peek() else {
            return Err(self.error("expected a string"));
        };
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, e)) if e == quote || e == '\\' => out.push(e),
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, e)) => {
                        out.push('\\');
                        out.push(e);
                    }
                    None => break,
                },
                c if c == quote => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                c => out.push(c),
            }
        }
        self.pos = self.expr.len();
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|&(i, c)| {
                !(c.is_ascii_digit()
                    || c == '.'
                    || c == 'e'
                    || c == 'E'
                    || (c == '-' || c == '+') && (i == 0 || self.rest()[..i].ends_with(['e', 'E'])))
            })
            .map(|(i, _)| i)
            .unwrap_or(self.rest().len());
        let text = &self.rest()[..len];
        let value = if text.contains(['.', 'e', 'E']) {
            text.parse::<f64>().map(Value::Float).ok()
        } else {
            text.parse::<i64>().map(Value::Integer).ok()
        };
        match value {
            Some(v) => {
                self.pos += len;
                Ok(v)
            }
            None => {
                self.pos = start;
                Err(self.error(&format!("invalid number '{}'", text)))
            }
        }
    }
}

/// Parse with no resolver attached; names that are not built-in stay
/// unresolved references.
impl std::str::FromStr for Type {
    type Err = PcoreError;

    fn from_str(s: &str) -> Result<Type> {
        parse_type(s, None)
    }
}

/// Convenience for callers holding a strong resolver handle.
pub fn parse_type_with(expr: &str, resolver: &Arc<dyn TypeResolver>) -> Result<Type> {
    parse_type(expr, Some(Arc::downgrade(resolver)))
}
