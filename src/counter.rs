//! Per-event run counters.
//!
//! Every completed trigger increments exactly one counter for its event
//! name: actions and filters are counted separately, and the count is per
//! trigger, not per callback invoked.

use hashbrown::HashMap;

/// Which kind of dispatch a trigger was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    /// Fire-and-forget dispatch; no value threaded.
    Action,
    /// Pipeline dispatch; a value threaded through the chain.
    Filter,
}

impl DispatchKind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchKind::Action => "action",
            DispatchKind::Filter => "filter",
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    actions: u64,
    filters: u64,
}

/// Table of per-event dispatch counts.
#[derive(Debug, Default)]
pub struct RunCounter {
    counts: HashMap<String, Counts>,
}

impl RunCounter {
    /// Creates an empty counter table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for one completed trigger of `event`.
    ///
    /// A never-seen event starts from zero.
    pub fn increment(&mut self, event: &str, kind: DispatchKind) {
        let counts = self.counts.entry_ref(event).or_default();
        match kind {
            DispatchKind::Action => counts.actions += 1,
            DispatchKind::Filter => counts.filters += 1,
        }
    }

    /// Returns how many times `event` has been triggered as `kind`.
    ///
    /// Returns 0 for events that were never triggered.
    #[must_use]
    pub fn get(&self, event: &str, kind: DispatchKind) -> u64 {
        self.counts.get(event).map_or(0, |counts| match kind {
            DispatchKind::Action => counts.actions,
            DispatchKind::Filter => counts.filters,
        })
    }

    /// Discards every count.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
