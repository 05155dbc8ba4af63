//! Recursion guard for equality and assignability on cyclic graphs.

use std::collections::HashSet;

/// The set of (left, right) identity pairs currently being compared in one
/// top-level call. Re-entering a pair that is already in the set answers
/// optimistically instead of recursing.
///
/// A guard belongs to a single call chain. It is never stored in a type or a
/// context and never shared between threads.
#[derive(Debug, Default)]
pub struct Guard {
    active: HashSet<(usize, usize)>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the pair as in progress. Returns `false` when the pair was
    /// already being compared further up the call chain.
    pub fn enter(&mut self, left: usize, right: usize) -> bool {
        self.active.insert((left, right))
    }

    pub fn leave(&mut self, left: usize, right: usize) {
        self.active.remove(&(left, right));
    }

    /// Run `f` with the pair marked in progress, or return `seen` when the
    /// pair is already active.
    pub fn with<F>(&mut self, left: usize, right: usize, seen: bool, f: F) -> bool
    where
        F: FnOnce(&mut Guard) -> bool,
    {
        if !self.enter(left, right) {
            return seen;
        }
        let result = f(self);
        self.leave(left, right);
        result
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
