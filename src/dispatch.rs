//! Dispatch: triggering actions and filter chains.
//!
//! This module holds the triggering half of [`HookEngine`]: fire-and-forget
//! [`dispatch_action`](HookEngine::dispatch_action) and value-threading
//! [`apply_filter`](HookEngine::apply_filter), plus their deprecated-hook
//! variants.
//!
//! One dispatch proceeds in a fixed order: bump the run counter, run the
//! [`ALL_HOOK`] listeners (if any), snapshot the event's own entries, then
//! invoke them with arity adaptation. The event snapshot is taken *after*
//! the meta pass, so an `"all"` listener that registers callbacks for the
//! event being dispatched sees them run in the same trigger.
//!
//! Current-hook bookkeeping is pushed before and popped after both the
//! event as a whole and every individual callback. The pops are drop
//! guards, so they run on every exit path; a callback that fails (or
//! panics) cannot leave a stale frame on the context stacks.

use serde_json::Value;
use tracing::{debug, warn};

use crate::counter::DispatchKind;
use crate::engine::HookEngine;
use crate::error::DispatchError;
use crate::registry::CallbackEntry;

/// Reserved meta-event observing every dispatch of every other event.
///
/// Callbacks registered under this name run before the dispatched event's
/// own callbacks, receive the event name as their first argument followed
/// by the full original argument list (no arity adaptation), and exist for
/// global tracing and debugging tools. Registering under `"all"` does not
/// make an otherwise-empty event dispatch anything of its own.
pub const ALL_HOOK: &str = "all";

/// Pops the event stack when dropped.
struct EventPopGuard<'e> {
    engine: &'e HookEngine,
}

impl Drop for EventPopGuard<'_> {
    fn drop(&mut self) {
        self.engine.state.lock().context.pop_event();
    }
}

/// Pops one event's callback stack when dropped.
struct CallbackPopGuard<'e> {
    engine: &'e HookEngine,
    event: &'e str,
}

impl Drop for CallbackPopGuard<'_> {
    fn drop(&mut self) {
        self.engine.state.lock().context.pop_callback(self.event);
    }
}

impl HookEngine {
    /// Triggers `event` as an action: every callback runs in priority and
    /// insertion order, return values are discarded.
    ///
    /// An event with no callbacks (and no [`ALL_HOOK`] listeners) is a
    /// no-op, never an error. When no arguments are supplied, callbacks
    /// receive a single empty-string argument instead, which keeps old
    /// positional-argument callers that still read argument 0 working.
    ///
    /// # Errors
    ///
    /// The first callback to fail aborts the remaining chain; its fault is
    /// returned as a [`DispatchError`] with the context stacks already
    /// unwound.
    pub fn dispatch_action(&self, event: &str, args: &[Value]) -> Result<(), DispatchError> {
        let mut event_guard = None;

        let meta_entries = {
            let mut state = self.state.lock();
            state.counter.increment(event, DispatchKind::Action);
            let meta = state.registry.snapshot(ALL_HOOK);
            if !meta.is_empty() {
                state.context.push_event(event);
                event_guard = Some(EventPopGuard { engine: self });
            }
            meta
        };

        if !meta_entries.is_empty() {
            let mut meta_args = Vec::with_capacity(args.len() + 1);
            meta_args.push(Value::String(event.to_owned()));
            meta_args.extend_from_slice(args);
            self.run_meta_pass(event, &meta_entries, &meta_args)?;
        }

        let entries = {
            let mut state = self.state.lock();
            let entries = state.registry.snapshot(event);
            if entries.is_empty() {
                return Ok(());
            }
            if event_guard.is_none() {
                state.context.push_event(event);
                event_guard = Some(EventPopGuard { engine: self });
            }
            entries
        };

        let fallback;
        let args = if args.is_empty() {
            fallback = [Value::String(String::new())];
            &fallback[..]
        } else {
            args
        };

        debug!(event, callbacks = entries.len(), "dispatching action");
        for entry in &entries {
            let call_args = adapt(args, entry.accepted_args());
            self.invoke_entry(event, entry, &call_args)?;
        }
        Ok(())
    }

    /// Triggers `event` as a filter: `value` is threaded through every
    /// callback in priority and insertion order, each return value feeding
    /// the next callback.
    ///
    /// An event with no callbacks (and no [`ALL_HOOK`] listeners) returns
    /// `value` unchanged. A callback registered with `accepted_args == 1`
    /// receives only the current value; larger arities also see `args`.
    ///
    /// # Errors
    ///
    /// The first callback to fail aborts the remaining chain; its fault is
    /// returned as a [`DispatchError`] with the context stacks already
    /// unwound. The partially-threaded value is lost with it.
    pub fn apply_filter(
        &self,
        event: &str,
        value: Value,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        let mut event_guard = None;

        let meta_entries = {
            let mut state = self.state.lock();
            state.counter.increment(event, DispatchKind::Filter);
            let meta = state.registry.snapshot(ALL_HOOK);
            if !meta.is_empty() {
                state.context.push_event(event);
                event_guard = Some(EventPopGuard { engine: self });
            }
            meta
        };

        if !meta_entries.is_empty() {
            let mut meta_args = Vec::with_capacity(args.len() + 2);
            meta_args.push(Value::String(event.to_owned()));
            meta_args.push(value.clone());
            meta_args.extend_from_slice(args);
            self.run_meta_pass(event, &meta_entries, &meta_args)?;
        }

        let entries = {
            let mut state = self.state.lock();
            let entries = state.registry.snapshot(event);
            if entries.is_empty() {
                return Ok(value);
            }
            if event_guard.is_none() {
                state.context.push_event(event);
                event_guard = Some(EventPopGuard { engine: self });
            }
            entries
        };

        debug!(event, callbacks = entries.len(), "applying filter chain");
        let mut current = value;
        for entry in &entries {
            let call_args = adapt_chain(current, args, entry.accepted_args());
            current = self.invoke_entry(event, entry, &call_args)?;
        }
        Ok(current)
    }

    /// [`dispatch_action`](Self::dispatch_action) for a hook that is no
    /// longer supposed to be used.
    ///
    /// Emits a deprecation warning through `tracing` naming the hook, the
    /// version it was deprecated in, and the replacement (when one exists),
    /// then dispatches normally. The warning fires even when nothing is
    /// registered for the hook.
    ///
    /// # Errors
    ///
    /// Same failure behavior as [`dispatch_action`](Self::dispatch_action).
    pub fn dispatch_action_deprecated(
        &self,
        event: &str,
        args: &[Value],
        since: &str,
        replacement: Option<&str>,
    ) -> Result<(), DispatchError> {
        warn_deprecated(event, DispatchKind::Action, since, replacement);
        self.dispatch_action(event, args)
    }

    /// [`apply_filter`](Self::apply_filter) for a hook that is no longer
    /// supposed to be used.
    ///
    /// Emits the same deprecation warning as
    /// [`dispatch_action_deprecated`](Self::dispatch_action_deprecated),
    /// then filters normally.
    ///
    /// # Errors
    ///
    /// Same failure behavior as [`apply_filter`](Self::apply_filter).
    pub fn apply_filter_deprecated(
        &self,
        event: &str,
        value: Value,
        args: &[Value],
        since: &str,
        replacement: Option<&str>,
    ) -> Result<Value, DispatchError> {
        warn_deprecated(event, DispatchKind::Filter, since, replacement);
        self.apply_filter(event, value, args)
    }

    /// Runs the [`ALL_HOOK`] listeners with the full prefixed argument
    /// list. Arity adaptation deliberately does not apply here.
    fn run_meta_pass(
        &self,
        event: &str,
        entries: &[CallbackEntry],
        args: &[Value],
    ) -> Result<(), DispatchError> {
        for entry in entries {
            self.invoke_entry(event, entry, args)?;
        }
        Ok(())
    }

    /// Invokes one entry with per-callback context bookkeeping around it.
    fn invoke_entry(
        &self,
        event: &str,
        entry: &CallbackEntry,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        self.state
            .lock()
            .context
            .push_callback(event, entry.id().clone());
        let _guard = CallbackPopGuard {
            engine: self,
            event,
        };
        entry
            .invoke(args)
            .map_err(|source| DispatchError::new(event, entry.id().clone(), source))
    }
}

/// Takes the first `accepted` arguments, padding with nulls when fewer
/// were supplied.
fn adapt(args: &[Value], accepted: usize) -> Vec<Value> {
    let mut out: Vec<Value> = args.iter().take(accepted).cloned().collect();
    out.resize(accepted, Value::Null);
    out
}

/// Builds a filter callback's argument list: the threaded value first,
/// then the extra arguments, truncated or padded to `accepted`.
fn adapt_chain(current: Value, args: &[Value], accepted: usize) -> Vec<Value> {
    if accepted == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(accepted);
    out.push(current);
    out.extend(args.iter().take(accepted - 1).cloned());
    out.resize(accepted, Value::Null);
    out
}

fn warn_deprecated(event: &str, kind: DispatchKind, since: &str, replacement: Option<&str>) {
    match replacement {
        Some(replacement) => warn!(
            event,
            kind = kind.as_str(),
            since,
            replacement,
            "deprecated hook dispatched"
        ),
        None => warn!(
            event,
            kind = kind.as_str(),
            since,
            "deprecated hook dispatched with no replacement"
        ),
    }
}
