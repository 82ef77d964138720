//! The hook engine: one service object owning all dispatch state.
//!
//! [`HookEngine`] composes the three stateful components behind a single
//! lock: the [`HookRegistry`] (who is registered where), the [`RunCounter`]
//! (how often each event has fired), and the [`CurrentHookContext`] (what is
//! executing right now). Construct one explicitly and share it by reference
//! or `Arc`; there is no ambient global instance, and [`reset`](HookEngine::reset)
//! restores a freshly-constructed state for test isolation.
//!
//! # Thread Safety
//!
//! All methods take `&self`; interior mutability goes through one
//! `parking_lot::Mutex`. The lock guards mutation and snapshot-taking only.
//! It is never held while a callback runs, so callbacks are free to call
//! back into the engine (register, remove, or trigger nested dispatches)
//! without deadlocking.
//!
//! # Example
//!
//! ```
//! use tapline::{Callback, HookEngine};
//! use serde_json::Value;
//!
//! let engine = HookEngine::new();
//! engine.register("title", Callback::anonymous(|args: &[Value]| {
//!     let s = args[0].as_str().unwrap_or_default();
//!     Ok(Value::String(format!("{s}!")))
//! }));
//!
//! let out = engine.apply_filter("title", Value::from("hello"), &[]).unwrap();
//! assert_eq!(out, Value::from("hello!"));
//! ```

use core::fmt;

use parking_lot::Mutex;
use tracing::debug;

use crate::callback::{Callback, CallbackId};
use crate::context::CurrentHookContext;
use crate::counter::{DispatchKind, RunCounter};
use crate::registry::{DEFAULT_PRIORITY, HookRegistry};

/// The shared-state unit behind the engine lock.
#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) registry: HookRegistry,
    pub(crate) counter: RunCounter,
    pub(crate) context: CurrentHookContext,
}

/// Priority-ordered named-event dispatch engine.
///
/// See the [module docs](self) for construction and locking behavior, and
/// [`dispatch_action`](Self::dispatch_action) /
/// [`apply_filter`](Self::apply_filter) for triggering.
#[derive(Default)]
pub struct HookEngine {
    pub(crate) state: Mutex<EngineState>,
}

impl HookEngine {
    /// Creates an engine with no registrations and zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Registers `callback` for `event` at the default priority (10),
    /// accepting one argument.
    pub fn register(&self, event: &str, callback: Callback) {
        self.register_with(event, callback, DEFAULT_PRIORITY, 1);
    }

    /// Registers `callback` for `event` with explicit priority and arity.
    ///
    /// Lower priority numbers run earlier; ties run in registration order.
    /// `accepted_args` is how many arguments the callback is invoked with,
    /// counting the threaded value first for filters. Re-registering an
    /// identity that already exists for this event moves it instead of
    /// duplicating it.
    pub fn register_with(
        &self,
        event: &str,
        callback: Callback,
        priority: i32,
        accepted_args: usize,
    ) {
        self.state
            .lock()
            .registry
            .add(event, callback, priority, accepted_args);
    }

    /// Removes the registration matching `id` at exactly `priority`.
    ///
    /// Returns whether something was removed; removing an absent callback
    /// is not an error.
    pub fn unregister(&self, event: &str, id: &CallbackId, priority: i32) -> bool {
        self.state.lock().registry.remove(event, id, priority)
    }

    /// Removes every callback of `event`, or only those at `priority`.
    pub fn unregister_all(&self, event: &str, priority: Option<i32>) {
        self.state.lock().registry.remove_all(event, priority);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    /// Returns whether `event` has any registered callback.
    #[must_use]
    pub fn has_callbacks(&self, event: &str) -> bool {
        self.state.lock().registry.has_callbacks(event)
    }

    /// Returns whether `event` has any callback at exactly `priority`.
    #[must_use]
    pub fn has_callbacks_at(&self, event: &str, priority: i32) -> bool {
        self.state.lock().registry.has_callbacks_at(event, priority)
    }

    /// Returns the priority `id` is registered at for `event`, or `None`
    /// when it is not registered at all.
    #[must_use]
    pub fn find_callback(&self, event: &str, id: &CallbackId) -> Option<i32> {
        self.state.lock().registry.find(event, id)
    }

    /// Returns how many times `event` has been triggered as `kind`.
    #[must_use]
    pub fn run_count(&self, event: &str, kind: DispatchKind) -> u64 {
        self.state.lock().counter.get(event, kind)
    }

    /// Returns every event name with at least one callback, sorted.
    #[must_use]
    pub fn event_names(&self) -> Vec<String> {
        self.state.lock().registry.event_names()
    }

    /// Returns the number of callbacks registered for `event`.
    #[must_use]
    pub fn callback_count(&self, event: &str) -> usize {
        self.state.lock().registry.callback_count(event)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────

    /// Returns the innermost currently-executing event, if any.
    #[must_use]
    pub fn current_event(&self) -> Option<String> {
        self.state.lock().context.current_event().map(str::to_owned)
    }

    /// Returns whether any dispatch is in flight on this engine.
    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.state.lock().context.is_dispatching()
    }

    /// Returns whether `event` is executing at any nesting depth.
    #[must_use]
    pub fn is_running(&self, event: &str) -> bool {
        self.state.lock().context.is_running(event)
    }

    /// Returns the identity of the innermost currently-executing callback
    /// of `event`.
    #[must_use]
    pub fn current_callback(&self, event: &str) -> Option<CallbackId> {
        self.state.lock().context.current_callback(event).cloned()
    }

    /// Returns the full nested-event stack, outermost first.
    #[must_use]
    pub fn event_traceback(&self) -> Vec<String> {
        self.state.lock().context.event_traceback().to_vec()
    }

    /// Returns the callback identities currently executing for `event`,
    /// outermost first.
    #[must_use]
    pub fn callback_traceback(&self, event: &str) -> Vec<CallbackId> {
        self.state.lock().context.callback_traceback(event).to_vec()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Restores the engine to a freshly-constructed state.
    ///
    /// Drops every registration, zeroes every counter, and clears the
    /// current-hook bookkeeping. Intended for test isolation; calling it
    /// from inside a running dispatch also discards the in-flight context,
    /// so don't.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.registry.clear();
        state.counter.clear();
        state.context.clear();
        debug!("hook engine reset");
    }
}

impl fmt::Debug for HookEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HookEngine")
            .field("events", &state.registry.event_names())
            .field("dispatch_depth", &state.context.event_traceback().len())
            .finish()
    }
}
