//! Identity-keyed sequence numbering for one conversion.

use std::collections::HashMap;

use pcore::Value;

/// Assigns sequence numbers to tagged values in visit order, starting at 1.
///
/// Values with identity are remembered so that a second visit of the same
/// instance yields the number of the first. The tracker keeps a handle on
/// every remembered value, so an address cannot be reused by another value
/// while the tracker lives. One tracker per conversion.
#[derive(Default)]
pub struct RefTracker {
    last: usize,
    seen: HashMap<usize, (usize, Value)>,
}

impl RefTracker {
    pub fn new() -> Self {
        RefTracker::default()
    }

    /// Consume the next number without remembering anything under it.
    pub fn next_id(&mut self) -> usize {
        self.last += 1;
        self.last
    }

    /// The number of `value` and whether this is its first visit. Values
    /// without identity always get a fresh number.
    pub fn track(&mut self, value: &Value) -> (usize, bool) {
        let Some(identity) = value.identity() else {
            return (self.next_id(), true);
        };
        if let Some((id, _)) = self.seen.get(&identity) {
            return (*id, false);
        }
        let id = self.next_id();
        self.seen.insert(identity, (id, value.clone()));
        (id, true)
    }

    /// The number already given to `value`, if any.
    pub fn get(&self, value: &Value) -> Option<usize> {
        let identity = value.identity()?;
        self.seen.get(&identity).map(|(id, _)| *id)
    }

    /// How many numbers have been handed out.
    pub fn len(&self) -> usize {
        self.last
    }

    pub fn is_empty(&self) -> bool {
        self.last == 0
    }
}
