//! Token stream → plain value tree.

use indexmap::IndexMap;
use pcore::Value;

use crate::consumer::{ValueConsumer, PREF_KEY};
use crate::error::{Result, RichDataError};

/// An open container on the build stack.
pub(crate) enum Frame {
    Array(Vec<Value>),
    Hash {
        entries: IndexMap<String, Value>,
        /// Key waiting for its value.
        key: Option<String>,
        /// Sequence number of a tagged hash.
        tag: Option<usize>,
    },
}

/// Stack-based assembly of nested values, shared by the collector and the
/// deserializer.
#[derive(Default)]
pub(crate) struct Tree {
    stack: Vec<Frame>,
    root: Option<Value>,
    path: Option<String>,
}

impl Tree {
    pub(crate) fn with_path(path: Option<String>) -> Self {
        Tree {
            path,
            ..Tree::default()
        }
    }

    pub(crate) fn open(&mut self, frame: Frame) -> Result<()> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(self.bad_data("more than one top-level value"));
        }
        self.stack.push(frame);
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<Frame> {
        match self.stack.pop() {
            Some(Frame::Hash { key: Some(key), .. }) => {
                Err(self.bad_data(format!("key '{key}' has no value")))
            }
            Some(frame) => Ok(frame),
            None => Err(self.bad_data("end without a matching begin")),
        }
    }

    pub(crate) fn top(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Frame> {
        self.stack.last_mut()
    }

    pub(crate) fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Place `value` in the innermost container, or make it the root.
    pub(crate) fn push(&mut self, value: Value) -> Result<()> {
        let Some(frame) = self.stack.last_mut() else {
            if self.root.is_some() {
                return Err(self.bad_data("more than one top-level value"));
            }
            self.root = Some(value);
            return Ok(());
        };
        let rejected = match frame {
            Frame::Array(elements) => {
                elements.push(value);
                None
            }
            Frame::Hash { entries, key, .. } => match (key.take(), value) {
                (Some(k), value) => {
                    entries.insert(k, value);
                    None
                }
                (None, Value::String(s)) => {
                    *key = Some(s);
                    None
                }
                (None, other) => Some(other),
            },
        };
        match rejected {
            Some(key) => Err(self.bad_data(format!(
                "hash key must be a String, got {}",
                key.ptype().generic()
            ))),
            None => Ok(()),
        }
    }

    /// JSON pointer of the node being built: the next array slot or the
    /// pending hash key of every open container. A hash waiting for a key
    /// adds nothing.
    pub(crate) fn pointer(&self) -> String {
        let mut pointer = String::new();
        for frame in &self.stack {
            match frame {
                Frame::Array(elements) => {
                    pointer.push('/');
                    pointer.push_str(&elements.len().to_string());
                }
                Frame::Hash { key: Some(k), .. } => {
                    pointer.push('/');
                    pointer.push_str(&k.replace('~', "~0").replace('/', "~1"));
                }
                Frame::Hash { key: None, .. } => {}
            }
        }
        pointer
    }

    pub(crate) fn bad_data(&self, detail: impl Into<String>) -> RichDataError {
        RichDataError::BadData {
            path: self.path.clone(),
            pointer: self.pointer(),
            detail: detail.into(),
        }
    }

    pub(crate) fn into_root(self) -> Result<Value> {
        if !self.stack.is_empty() {
            return Err(self.bad_data("input ended inside an open container"));
        }
        match self.root {
            Some(v) => Ok(v),
            None => Err(RichDataError::BadData {
                path: self.path,
                pointer: String::new(),
                detail: "no value".to_string(),
            }),
        }
    }
}

pub(crate) fn frame_value(frame: Frame) -> Value {
    match frame {
        Frame::Array(elements) => Value::array(elements),
        Frame::Hash { entries, .. } => Value::hash(entries),
    }
}

/// A consumer that builds the plain value tree of a token stream.
///
/// Nothing is interpreted: tagged hashes stay hashes and references become
/// `{"__pref": n}` hashes. Use it to inspect rich data without resolving
/// any types.
#[derive(Default)]
pub struct Collector {
    tree: Tree,
}

impl Collector {
    pub fn new() -> Self {
        Collector::default()
    }

    /// The collected value. Fails when the stream was incomplete or empty.
    pub fn value(self) -> Result<Value> {
        self.tree.into_root()
    }
}

impl ValueConsumer for Collector {
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
        self.tree.push(value)
    }

    fn add_ref(&mut self, id: usize) -> Result<()> {
        let mut entries = IndexMap::with_capacity(1);
        entries.insert(PREF_KEY.to_string(), Value::Integer(id as i64));
        self.tree.push(Value::hash(entries))
    }

    fn end(&mut self) -> Result<()> {
        let frame = self.tree.close()?;
        self.tree.push(frame_value(frame))
    }
}
