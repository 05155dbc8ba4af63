//! Token stream → value graph.
//!
//! The inverse of the serializer. A hash whose first key is `__ptype` is
//! tagged: it takes the next sequence number when it opens, and when it
//! closes the named type is resolved and asked to construct a value from
//! the remaining entries (or from `__pvalue` alone). `{"__pref": n}` stands
//! for the value numbered `n`.
//!
//! A reference may point at an object that is still open, as in a cyclic
//! graph. It is held as a placeholder until the stream ends, then the
//! placeholders are replaced by the finished objects.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use pcore::parser::parse_type_with;
use pcore::{ConstructArgs, Guard, Type, TypeResolver, Value};

use crate::collector::{frame_value, Frame, Tree};
use crate::consumer::{ValueConsumer, PTYPE_KEY, PVALUE_KEY};
use crate::error::{Result, RichDataError};
use crate::options::Options;

enum Slot {
    /// Tagged hash still being read.
    Open,
    Done(Value),
}

/// A consumer that rebuilds the values a serializer emitted.
pub struct Deserializer {
    resolver: Arc<dyn TypeResolver>,
    options: Options,
    tree: Tree,
    slots: Vec<Slot>,
    pending: bool,
}

impl Deserializer {
    pub fn new(resolver: Arc<dyn TypeResolver>) -> Self {
        Deserializer {
            resolver,
            options: Options::default(),
            tree: Tree::default(),
            slots: Vec::new(),
            pending: false,
        }
    }

    /// With `rich_data` off, tags are not interpreted and references are
    /// rejected.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Name the source in error locations.
    pub fn with_source(mut self, path: impl Into<String>) -> Self {
        self.tree = Tree::with_path(Some(path.into()));
        self
    }

    /// The finished value graph.
    pub fn value(self) -> Result<Value> {
        let pending = self.pending;
        let Deserializer { tree, slots, .. } = self;
        let path = tree.path().map(str::to_string);
        let root = tree.into_root()?;
        if !pending {
            return Ok(root);
        }
        Fixup::new(&slots, path).run(root)
    }

    fn is_tag_start(&self, value: &Value) -> bool {
        if !self.options.rich_data || value.as_str() != Some(PTYPE_KEY) {
            return false;
        }
        matches!(
            self.tree.top(),
            Some(Frame::Hash { entries, key: None, tag: None }) if entries.is_empty()
        )
    }

    fn resolve(&self, name: &str) -> pcore::Result<Type> {
        if name.contains(['[', '{']) {
            return parse_type_with(name, &self.resolver);
        }
        match Type::builtin(name) {
            Some(t) => Ok(t),
            None => self.resolver.resolve(name),
        }
    }

    fn construct(&self, mut entries: IndexMap<String, Value>) -> Result<Value> {
        let name = match entries.shift_remove(PTYPE_KEY) {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(self.tree.bad_data(format!(
                    "{PTYPE_KEY} must be a String, got {}",
                    other.ptype().generic()
                )))
            }
            None => return Err(self.tree.bad_data(format!("missing {PTYPE_KEY}"))),
        };
        let ty = self
            .resolve(&name)
            .map_err(|e| self.tree.bad_data(e.to_string()))?;
        let args = match entries.shift_remove(PVALUE_KEY) {
            Some(payload) if entries.is_empty() => ConstructArgs::Payload(payload),
            Some(_) => {
                return Err(self.tree.bad_data(format!(
                    "{PVALUE_KEY} must be the only entry besides {PTYPE_KEY}"
                )))
            }
            None => ConstructArgs::Hash(entries),
        };
        tracing::trace!(type_name = %name, "constructing tagged value");
        ty.construct(args, &self.resolver)
            .map_err(|e| self.tree.bad_data(e.to_string()))
    }
}

impl ValueConsumer for Deserializer {
    fn begin_array(&mut self, len: usize) -> Result<()> {
        self.tree.open(Frame::Array(Vec::with_capacity(len)))
    }

    fn begin_object(&mut self, len: usize) -> Result<()> {
        self.tree.open(Frame::Hash {
            entries: IndexMap::with_capacity(len),
            key: None,
            tag: None,
        })
    }

    fn add(&mut self, value: Value) -> Result<()> {
        if self.is_tag_start(&value) {
            self.slots.push(Slot::Open);
            let id = self.slots.len();
            if let Some(Frame::Hash { tag, .. }) = self.tree.top_mut() {
                *tag = Some(id);
            }
        }
        self.tree.push(value)
    }

    fn add_ref(&mut self, id: usize) -> Result<()> {
        if !self.options.rich_data {
            return Err(self.tree.bad_data("references require rich data"));
        }
        match id.checked_sub(1).and_then(|i| self.slots.get(i)) {
            Some(Slot::Done(v)) => {
                let v = v.clone();
                self.tree.push(v)
            }
            Some(Slot::Open) => {
                self.pending = true;
                self.tree.push(Value::Pending(id))
            }
            None => Err(self.tree.bad_data(format!("dangling reference {id}"))),
        }
    }

    fn end(&mut self) -> Result<()> {
        let frame = self.tree.close()?;
        let value = match frame {
            Frame::Hash {
                entries,
                tag: Some(id),
                ..
            } => {
                let value = self.construct(entries)?;
                if let Some(slot) = self.slots.get_mut(id - 1) {
                    *slot = Slot::Done(value.clone());
                }
                value
            }
            other => frame_value(other),
        };
        self.tree.push(value)
    }
}

/// Replaces placeholders with the objects they stand for.
struct Fixup<'a> {
    slots: &'a [Slot],
    path: Option<String>,
    visited: HashSet<usize>,
}

impl<'a> Fixup<'a> {
    fn new(slots: &'a [Slot], path: Option<String>) -> Self {
        Fixup {
            slots,
            path,
            visited: HashSet::new(),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn run(mut self, root: Value) -> Result<Value> {
        let pointer = String::new();
        Ok(match self.fix(&root, &pointer)? {
            Some(replaced) => replaced,
            None => root,
        })
    }

    /// The value to put in place of `value`, when it held placeholders.
    fn fix(&mut self, value: &Value, pointer: &str) -> Result<Option<Value>> {
        match value {
            Value::Pending(id) => self.target(*id, pointer).map(Some),
            Value::Array(elements) => {
                let mut rebuilt: Option<Vec<Value>> = None;
                for (i, e) in elements.iter().enumerate() {
                    if let Some(r) = self.fix(e, &format!("{pointer}/{i}"))? {
                        rebuilt.get_or_insert_with(|| elements.to_vec())[i] = r;
                    }
                }
                Ok(rebuilt.map(Value::array))
            }
            Value::Hash(entries) => {
                let mut rebuilt: Option<IndexMap<String, Value>> = None;
                for (k, v) in entries.iter() {
                    if let Some(r) = self.fix(v, &child(pointer, k))? {
                        rebuilt
                            .get_or_insert_with(|| entries.as_ref().clone())
                            .insert(k.clone(), r);
                    }
                }
                Ok(rebuilt.map(Value::hash))
            }
            Value::Object(o) => {
                let Some(identity) = value.identity() else {
                    return Ok(None);
                };
                if !self.visited.insert(identity) {
                    return Ok(None);
                }
                for (i, (name, v)) in o.attributes().into_iter().enumerate() {
                    let at = child(pointer, &name);
                    if let Some(r) = self.fix(&v, &at)? {
                        let ty = o.object_type().as_object().and_then(|t| {
                            t.all_attributes().into_iter().nth(i).map(|a| a.ty)
                        });
                        if let Some(ty) = ty {
                            if !ty.is_instance(&r, &mut Guard::new()) {
                                return Err(self.bad_data(
                                    at,
                                    format!(
                                        "{} attribute '{name}' expects a value of type {ty}, got {}",
                                        o.object_type(),
                                        r.ptype().generic()
                                    ),
                                ));
                            }
                        }
                        o.patch(i, r);
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn bad_data(&self, pointer: String, detail: String) -> RichDataError {
        RichDataError::BadData {
            path: self.path.clone(),
            pointer,
            detail,
        }
    }

    fn target(&self, id: usize, pointer: &str) -> Result<Value> {
        match id.checked_sub(1).and_then(|i| self.slots.get(i)) {
            Some(Slot::Done(v @ Value::Object(_))) => Ok(v.clone()),
            _ => Err(self.bad_data(
                pointer.to_string(),
                format!("reference {id} does not resolve to an object"),
            )),
        }
    }
}

fn child(pointer: &str, key: &str) -> String {
    format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"))
}

