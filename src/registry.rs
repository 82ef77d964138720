//! The hook table: ordered callback storage per event name.
//!
//! A [`HookRegistry`] maps each event name to a set of priority buckets.
//! Buckets are traversed lowest priority number first; within one bucket,
//! entries run in insertion order and are never reordered. Empty buckets and
//! empty events are pruned immediately, so presence in the table always
//! means "has at least one callback".
//!
//! The registry never invokes anything itself. The dispatcher asks for a
//! [`snapshot`](HookRegistry::snapshot) and iterates that, which is what
//! keeps an in-flight dispatch stable while callbacks mutate the live table.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde_json::Value;
use tracing::debug;

use crate::callback::{Callback, CallbackError, CallbackId};

/// Priority assigned when the caller does not specify one.
pub const DEFAULT_PRIORITY: i32 = 10;

// ─────────────────────────────────────────────────────────────────────────────
// CallbackEntry
// ─────────────────────────────────────────────────────────────────────────────

/// One registration: a callback plus its ordering and arity metadata.
///
/// Entries are owned by the bucket they live in; the dispatcher sees cheap
/// clones of them through [`HookRegistry::snapshot`].
#[derive(Debug, Clone)]
pub struct CallbackEntry {
    callback: Callback,
    priority: i32,
    accepted_args: usize,
    seq: u64,
}

impl CallbackEntry {
    /// Returns the identity of the registered callback.
    #[must_use]
    pub fn id(&self) -> &CallbackId {
        self.callback.id()
    }

    /// Returns the priority this entry was registered at.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns how many arguments the callback accepts.
    #[must_use]
    pub fn accepted_args(&self) -> usize {
        self.accepted_args
    }

    /// Returns the insertion sequence number, unique across the registry.
    ///
    /// Later registrations always carry larger numbers, which is what breaks
    /// ties inside one priority bucket.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Invokes the callback with an already-adapted argument slice.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, CallbackError> {
        self.callback.invoke(args)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered callback storage for every event name.
#[derive(Debug, Default)]
pub struct HookRegistry {
    /// Event name to priority buckets, priorities ascending.
    events: HashMap<String, BTreeMap<i32, Vec<CallbackEntry>>>,
    /// Registration sequence, shared across all events.
    next_seq: u64,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `callback` for `event` at `priority`.
    ///
    /// If the callback's identity is already registered for this event at
    /// any priority, the old entry is removed first: re-registration moves
    /// a callback, it never duplicates it. The new entry always goes to the
    /// back of its bucket with a fresh insertion sequence.
    pub fn add(&mut self, event: &str, callback: Callback, priority: i32, accepted_args: usize) {
        let buckets = self.events.entry_ref(event).or_default();
        if remove_identity(buckets, callback.id()) {
            debug!(event, callback = %callback.id(), "re-registering hook callback");
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        debug!(event, callback = %callback.id(), priority, accepted_args, "registered hook callback");
        buckets.entry(priority).or_default().push(CallbackEntry {
            callback,
            priority,
            accepted_args,
            seq,
        });
    }

    /// Removes the entry matching `id` at exactly `priority`.
    ///
    /// Returns whether an entry was removed. Removing an identity that is
    /// not registered at that priority is not an error, even if it is
    /// registered at some other priority. The event is pruned when its last
    /// bucket empties.
    pub fn remove(&mut self, event: &str, id: &CallbackId, priority: i32) -> bool {
        let Some(buckets) = self.events.get_mut(event) else {
            return false;
        };
        let Some(bucket) = buckets.get_mut(&priority) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|entry| entry.id() == id) else {
            return false;
        };

        bucket.remove(pos);
        if bucket.is_empty() {
            buckets.remove(&priority);
        }
        if buckets.is_empty() {
            self.events.remove(event);
        }
        debug!(event, callback = %id, priority, "removed hook callback");
        true
    }

    /// Removes every entry of `event`, or only the bucket at `priority`.
    ///
    /// Unknown events and empty buckets are fine; nothing is reported back.
    pub fn remove_all(&mut self, event: &str, priority: Option<i32>) {
        match priority {
            None => {
                self.events.remove(event);
            }
            Some(priority) => {
                if let Some(buckets) = self.events.get_mut(event) {
                    buckets.remove(&priority);
                    if buckets.is_empty() {
                        self.events.remove(event);
                    }
                }
            }
        }
        debug!(event, ?priority, "removed hook callbacks");
    }

    /// Returns whether `event` has any registered callback.
    #[must_use]
    pub fn has_callbacks(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Returns whether `event` has any callback at exactly `priority`.
    #[must_use]
    pub fn has_callbacks_at(&self, event: &str, priority: i32) -> bool {
        self.events
            .get(event)
            .is_some_and(|buckets| buckets.contains_key(&priority))
    }

    /// Returns the priority `id` is registered at for `event`.
    ///
    /// `None` is the not-found answer, distinct from every valid priority,
    /// so priority 0 registrations are still distinguishable from absence.
    #[must_use]
    pub fn find(&self, event: &str, id: &CallbackId) -> Option<i32> {
        let buckets = self.events.get(event)?;
        buckets
            .iter()
            .find(|(_, bucket)| bucket.iter().any(|entry| entry.id() == id))
            .map(|(priority, _)| *priority)
    }

    /// Returns an immutable traversal-order copy of `event`'s entries.
    ///
    /// The snapshot is taken at call time: buckets flattened lowest priority
    /// first, insertion order within each bucket. Later mutation of the
    /// live table does not affect entries already captured, which is what
    /// makes iteration stable against callbacks that add or remove entries
    /// for the same event while it is executing.
    #[must_use]
    pub fn snapshot(&self, event: &str) -> Vec<CallbackEntry> {
        self.events.get(event).map_or_else(Vec::new, |buckets| {
            buckets.values().flatten().cloned().collect()
        })
    }

    /// Returns the number of callbacks registered for `event`.
    #[must_use]
    pub fn callback_count(&self, event: &str) -> usize {
        self.events
            .get(event)
            .map_or(0, |buckets| buckets.values().map(Vec::len).sum())
    }

    /// Returns every event name with at least one callback, sorted.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Returns whether no event has any callback.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discards every registration.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// Removes `id` from whichever bucket holds it, pruning the bucket.
///
/// Returns whether an entry was removed. At most one entry can match,
/// because `add` maintains identity uniqueness per event.
fn remove_identity(buckets: &mut BTreeMap<i32, Vec<CallbackEntry>>, id: &CallbackId) -> bool {
    let Some((&priority, bucket)) = buckets
        .iter_mut()
        .find(|(_, bucket)| bucket.iter().any(|entry| entry.id() == id))
    else {
        return false;
    };

    bucket.retain(|entry| entry.id() != id);
    if bucket.is_empty() {
        buckets.remove(&priority);
    }
    true
}
