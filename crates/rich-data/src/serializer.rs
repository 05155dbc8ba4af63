//! Value graph → token stream.
//!
//! In rich-data mode every value whose kind cannot be told from plain data is
//! written as a hash tagged with `__ptype`:
//!
//! - object instance → `{"__ptype": <type name>, <attr>: <value>, …}` with only
//!   the attributes that differ from their defaults
//! - object type → `{"__ptype": "Pcore::ObjectType", …init hash}`
//! - type-set → `{"__ptype": "Pcore::TypeSet", …init hash}`
//! - any other type → `{"__ptype": "Type", "__pvalue": <canonical string>}`
//! - semantic version → `{"__ptype": "SemVer", "__pvalue": "1.0.0"}`
//! - `default` → `{"__ptype": "Default"}`
//! - a hash using a reserved key → `{"__ptype": "Hash", "__pvalue": [k1, v1, …]}`
//!
//! Each tagged hash takes the next sequence number. A second visit of the
//! same object instance (or type, with `type_by_reference`) is written as
//! `{"__pref": n}` instead.

use std::collections::HashSet;

use pcore::{Type, TypeKind, Value};

use crate::consumer::{is_reserved_key, ValueConsumer, PTYPE_KEY, PVALUE_KEY};
use crate::error::{Result, RichDataError};
use crate::options::Options;
use crate::tracker::RefTracker;

const OBJECT_TYPE_NAME: &str = "Pcore::ObjectType";
const TYPE_SET_NAME: &str = "Pcore::TypeSet";

#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer {
    options: Options,
}

impl Serializer {
    pub fn new(options: Options) -> Self {
        Serializer { options }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Walk `value` and drive `consumer` with its tokens. Sequence numbers
    /// start over at 1 on every call.
    #[tracing::instrument(level = "debug", skip_all, fields(rich_data = self.options.rich_data))]
    pub fn convert(&self, value: &Value, consumer: &mut dyn ValueConsumer) -> Result<()> {
        let mut walk = Walk {
            options: self.options,
            tracker: RefTracker::new(),
            open: HashSet::new(),
            consumer,
        };
        walk.value(value)?;
        tracing::debug!(ids = walk.tracker.len(), "value converted");
        Ok(())
    }
}

struct Walk<'a> {
    options: Options,
    tracker: RefTracker,
    /// Objects on the current path, for cycle detection in bare mode.
    open: HashSet<usize>,
    consumer: &'a mut dyn ValueConsumer,
}

impl Walk<'_> {
    fn value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Undef
            | Value::Boolean(_)
            | Value::Integer(_)
            | Value::Float(_)
            | Value::String(_) => self.consumer.add(value.clone()),
            Value::Default if self.options.rich_data => {
                self.tracker.next_id();
                self.consumer.begin_object(1)?;
                self.tag("Default")?;
                self.consumer.end()
            }
            Value::Default => self.consumer.add(Value::string("default")),
            Value::SemVer(v) if self.options.rich_data => {
                self.tracker.next_id();
                self.payload("SemVer", Value::string(v.to_string()))
            }
            Value::SemVer(v) => self.consumer.add(Value::string(v.to_string())),
            Value::Array(elements) => {
                self.consumer.begin_array(elements.len())?;
                for e in elements.iter() {
                    self.value(e)?;
                }
                self.consumer.end()
            }
            Value::Hash(entries) => {
                if self.options.rich_data && entries.keys().any(|k| is_reserved_key(k)) {
                    return self.escaped_hash(value);
                }
                self.consumer.begin_object(entries.len())?;
                for (k, v) in entries.iter() {
                    self.consumer.add(Value::string(k.as_str()))?;
                    self.value(v)?;
                }
                self.consumer.end()
            }
            Value::Object(o) => {
                let name = o.object_type().to_string();
                let init = o.init_hash();
                if self.options.rich_data {
                    if let Some(id) = self.tracker.get(value) {
                        return self.consumer.add_ref(id);
                    }
                    self.tracker.track(value);
                    self.consumer.begin_object(init.len() + 1)?;
                    self.tag(&name)?;
                    self.entries(init.iter())?;
                    return self.consumer.end();
                }
                let identity = Value::identity(value).unwrap_or_default();
                if !self.open.insert(identity) {
                    return Err(RichDataError::Cycle { type_name: name });
                }
                self.consumer.begin_object(init.len())?;
                self.entries(init.iter())?;
                self.open.remove(&identity);
                self.consumer.end()
            }
            Value::Type(t) if self.options.rich_data => self.rich_type(value, t),
            Value::Type(t) => self.consumer.add(Value::string(t.to_string())),
            Value::Pending(_) => Err(RichDataError::Unsupported {
                type_name: "Pending".to_string(),
            }),
        }
    }

    fn rich_type(&mut self, value: &Value, t: &Type) -> Result<()> {
        if self.options.type_by_reference {
            if let Some(id) = self.tracker.get(value) {
                return self.consumer.add_ref(id);
            }
            self.tracker.track(value);
        } else {
            self.tracker.next_id();
        }
        let (name, init) = match t.kind() {
            TypeKind::Object(o) if !o.is_default() => (OBJECT_TYPE_NAME, o.init_hash()),
            TypeKind::TypeSet(ts) if !ts.is_default() => (TYPE_SET_NAME, ts.init_hash()),
            _ => return self.payload("Type", Value::string(t.to_string())),
        };
        self.consumer.begin_object(init.len() + 1)?;
        self.tag(name)?;
        self.entries(init.iter())?;
        self.consumer.end()
    }

    /// `{"__ptype": "Hash", "__pvalue": [k1, v1, …]}` for a hash whose keys
    /// would otherwise be read as tags.
    fn escaped_hash(&mut self, value: &Value) -> Result<()> {
        let Value::Hash(entries) = value else {
            return Ok(());
        };
        self.tracker.next_id();
        self.consumer.begin_object(2)?;
        self.tag("Hash")?;
        self.consumer.add(Value::string(PVALUE_KEY))?;
        self.consumer.begin_array(entries.len() * 2)?;
        for (k, v) in entries.iter() {
            self.consumer.add(Value::string(k.as_str()))?;
            self.value(v)?;
        }
        self.consumer.end()?;
        self.consumer.end()
    }

    fn payload(&mut self, type_name: &str, payload: Value) -> Result<()> {
        self.consumer.begin_object(2)?;
        self.tag(type_name)?;
        self.consumer.add(Value::string(PVALUE_KEY))?;
        self.value(&payload)?;
        self.consumer.end()
    }

    fn tag(&mut self, type_name: &str) -> Result<()> {
        self.consumer.add(Value::string(PTYPE_KEY))?;
        self.consumer.add(Value::string(type_name))
    }

    fn entries<'v>(&mut self, entries: impl Iterator<Item = (&'v String, &'v Value)>) -> Result<()> {
        for (k, v) in entries {
            self.consumer.add(Value::string(k.as_str()))?;
            self.value(v)?;
        }
        Ok(())
    }
}
