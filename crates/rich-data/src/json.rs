//! JSON rendering of the token stream.
//!
//! [`JsonStreamer`] writes tokens to an [`io::Write`] as they arrive and
//! [`json_to_data`] reads JSON from an [`io::Read`] and drives a consumer, so
//! neither side builds a JSON tree. Integers and floats stay distinct in both
//! directions: `1` reads as an integer and `1.0` as a float.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use pcore::{TypeResolver, Value};
use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};

use crate::consumer::{ValueConsumer, PREF_KEY};
use crate::deserializer::Deserializer;
use crate::error::{Result, RichDataError};
use crate::options::Options;
use crate::serializer::Serializer;

struct Level {
    object: bool,
    count: usize,
    after_key: bool,
}

/// A consumer that writes compact JSON.
pub struct JsonStreamer<W: Write> {
    out: W,
    levels: Vec<Level>,
}

impl<W: Write> JsonStreamer<W> {
    pub fn new(out: W) -> Self {
        JsonStreamer {
            out,
            levels: Vec::new(),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the separator a new element needs. Returns true when the
    /// element is a hash key.
    fn separate(&mut self) -> Result<bool> {
        let Some(level) = self.levels.last_mut() else {
            return Ok(false);
        };
        if level.object && !level.after_key {
            if level.count > 0 {
                self.out.write_all(b",")?;
            }
            level.after_key = true;
            return Ok(true);
        }
        if level.object {
            level.after_key = false;
        } else if level.count > 0 {
            self.out.write_all(b",")?;
        }
        level.count += 1;
        Ok(false)
    }

    fn open(&mut self, object: bool) -> Result<()> {
        if self.separate()? {
            return Err(key_error("a container"));
        }
        self.out.write_all(if object { b"{" } else { b"[" })?;
        self.levels.push(Level {
            object,
            count: 0,
            after_key: false,
        });
        Ok(())
    }

    fn scalar(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Undef => self.out.write_all(b"null")?,
            Value::Boolean(b) => self.out.write_all(if *b { b"true" } else { b"false" })?,
            Value::Integer(i) => write!(self.out, "{i}")?,
            Value::Float(f) if f.is_finite() => {
                serde_json::to_writer(&mut self.out, f).map_err(io::Error::from)?
            }
            Value::String(s) => serde_json::to_writer(&mut self.out, s).map_err(io::Error::from)?,
            other => {
                return Err(RichDataError::Unsupported {
                    type_name: other.ptype().generic().to_string(),
                })
            }
        }
        Ok(())
    }
}

fn key_error(what: &str) -> RichDataError {
    RichDataError::Unsupported {
        type_name: format!("{what} as a JSON object key"),
    }
}

impl<W: Write> ValueConsumer for JsonStreamer<W> {
    fn begin_array(&mut self, _len: usize) -> Result<()> {
        self.open(false)
    }

    fn begin_object(&mut self, _len: usize) -> Result<()> {
        self.open(true)
    }

    fn add(&mut self, value: Value) -> Result<()> {
        if self.separate()? {
            let Value::String(key) = &value else {
                return Err(key_error(&value.ptype().generic().to_string()));
            };
            serde_json::to_writer(&mut self.out, key).map_err(io::Error::from)?;
            self.out.write_all(b":")?;
            return Ok(());
        }
        self.scalar(&value)
    }

    fn add_ref(&mut self, id: usize) -> Result<()> {
        if self.separate()? {
            return Err(key_error("a reference"));
        }
        write!(self.out, "{{\"{PREF_KEY}\":{id}}}")?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let Some(level) = self.levels.pop() else {
            return Err(RichDataError::Unsupported {
                type_name: "end without a matching begin".to_string(),
            });
        };
        self.out.write_all(if level.object { b"}" } else { b"]" })?;
        Ok(())
    }
}

/// Read one JSON value from `reader` and stream it to `consumer`.
///
/// `{"__pref": n}` becomes a reference; everything else is passed through
/// as arrays, hashes and scalars. Syntax errors are reported as bad JSON in
/// `path`. Errors raised by the consumer are returned as they are.
#[tracing::instrument(level = "debug", skip(reader, consumer))]
pub fn json_to_data<R: Read>(path: &str, reader: R, consumer: &mut dyn ValueConsumer) -> Result<()> {
    let mut failure = None;
    let mut de = serde_json::Deserializer::from_reader(reader);
    let outcome = Stream {
        consumer,
        failure: &mut failure,
    }
    .deserialize(&mut de)
    .and_then(|()| de.end());
    if let Some(e) = failure {
        return Err(e);
    }
    outcome.map_err(|e| RichDataError::BadJson {
        path: path.to_string(),
        detail: e.to_string(),
    })
}

/// Serialize `value` as rich-data JSON.
pub fn encode(value: &Value, options: Options) -> Result<String> {
    let mut streamer = JsonStreamer::new(Vec::new());
    Serializer::new(options).convert(value, &mut streamer)?;
    String::from_utf8(streamer.into_inner())
        .map_err(|e| RichDataError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Read rich-data JSON back into a value, resolving `__ptype` names with
/// `resolver`.
pub fn decode(json: &str, resolver: Arc<dyn TypeResolver>) -> Result<Value> {
    let mut deserializer = Deserializer::new(resolver);
    json_to_data("<string>", json.as_bytes(), &mut deserializer)?;
    deserializer.value()
}

struct Stream<'a, C: ?Sized> {
    consumer: &'a mut C,
    failure: &'a mut Option<RichDataError>,
}

impl<C: ValueConsumer + ?Sized> Stream<'_, C> {
    fn reborrow(&mut self) -> Stream<'_, C> {
        Stream {
            consumer: &mut *self.consumer,
            failure: &mut *self.failure,
        }
    }

    /// Run a consumer call, parking its error so that it wins over the
    /// parse error used to stop the reader.
    fn emit<E: de::Error>(
        &mut self,
        f: impl FnOnce(&mut C) -> Result<()>,
    ) -> std::result::Result<(), E> {
        f(&mut *self.consumer).map_err(|e| {
            let message = e.to_string();
            *self.failure = Some(e);
            E::custom(message)
        })
    }
}

impl<'de, C: ValueConsumer + ?Sized> DeserializeSeed<'de> for Stream<'_, C> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de, C: ValueConsumer + ?Sized> Visitor<'de> for Stream<'_, C> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_unit<E: de::Error>(mut self) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::Undef))
    }

    fn visit_none<E: de::Error>(mut self) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::Undef))
    }

    fn visit_bool<E: de::Error>(mut self, v: bool) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::Boolean(v)))
    }

    fn visit_i64<E: de::Error>(mut self, v: i64) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::Integer(v)))
    }

    fn visit_u64<E: de::Error>(mut self, v: u64) -> std::result::Result<(), E> {
        let value = match i64::try_from(v) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Float(v as f64),
        };
        self.emit(|c| c.add(value))
    }

    fn visit_f64<E: de::Error>(mut self, v: f64) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::Float(v)))
    }

    fn visit_str<E: de::Error>(mut self, v: &str) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::string(v)))
    }

    fn visit_string<E: de::Error>(mut self, v: String) -> std::result::Result<(), E> {
        self.emit(|c| c.add(Value::String(v)))
    }

    fn visit_seq<A>(mut self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        let hint = seq.size_hint().unwrap_or(0);
        self.emit::<A::Error>(|c| c.begin_array(hint))?;
        while seq.next_element_seed(self.reborrow())?.is_some() {}
        self.emit(|c| c.end())
    }

    fn visit_map<A>(mut self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let hint = map.size_hint().unwrap_or(0);
        let Some(first) = map.next_key::<String>()? else {
            self.emit::<A::Error>(|c| c.begin_object(0))?;
            return self.emit(|c| c.end());
        };
        if first == PREF_KEY {
            let id: usize = map.next_value()?;
            if map.next_key::<String>()?.is_some() {
                return Err(de::Error::custom(format!(
                    "{PREF_KEY} must be the only key of its object"
                )));
            }
            return self.emit(|c| c.add_ref(id));
        }
        self.emit::<A::Error>(|c| c.begin_object(hint))?;
        self.emit::<A::Error>(|c| c.add(Value::String(first)))?;
        map.next_value_seed(self.reborrow())?;
        while let Some(key) = map.next_key::<String>()? {
            self.emit::<A::Error>(|c| c.add(Value::String(key)))?;
            map.next_value_seed(self.reborrow())?;
        }
        self.emit(|c| c.end())
    }
}
