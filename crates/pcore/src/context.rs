//! Evaluation context.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use indexmap::IndexMap;

use crate::error::Result;
use crate::loader::{Loader, TypeResolver};
use crate::types::Type;
use crate::value::Value;

/// State of one evaluation activity: a shared loader and a private scope.
///
/// Contexts are not shared between threads. A new activity gets its own
/// [`fork`](Context::fork), which copies the scope and shares the loader.
/// Guards are never part of a context; each check creates its own.
#[derive(Clone)]
pub struct Context {
    loader: Arc<Loader>,
    scope: IndexMap<String, Value>,
}

impl Context {
    pub fn new(loader: Arc<Loader>) -> Self {
        Context {
            loader,
            scope: IndexMap::new(),
        }
    }

    pub fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    /// The loader as a resolver, for the deserializer.
    pub fn resolver(&self) -> Arc<dyn TypeResolver> {
        self.loader.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scope.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.scope.insert(name.into(), value);
    }

    pub fn parse_type(&self, expr: &str) -> Result<Type> {
        self.loader.parse_type(expr)
    }

    pub fn resolve(&self, name: &str) -> Result<Type> {
        self.loader.resolve(name)
    }

    /// A copy of this context for another activity. Scope changes in the
    /// fork are not seen here, and vice versa.
    pub fn fork(&self) -> Context {
        self.clone()
    }

    /// Run `f` on a new thread with a forked context.
    pub fn spawn<F, R>(&self, f: F) -> JoinHandle<R>
    where
        F: FnOnce(Context) -> R + Send + 'static,
        R: Send + 'static,
    {
        let forked = self.fork();
        thread::spawn(move || f(forked))
    }
}
