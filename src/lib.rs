//! Priority-ordered named-event dispatch.
//!
//! `tapline` lets callers register callbacks against named events
//! ("hooks"), then trigger them two ways: **actions** (fire-and-forget,
//! side effects only) and **filters** (a value threaded through an ordered
//! chain of transforms). Ordering is deterministic: lower priority numbers
//! run first, ties run in registration order. Dispatch is synchronous and
//! re-entrant; callbacks may register, remove, or trigger hooks themselves
//! without corrupting the dispatch already in flight.
//!
//! # Core Concepts
//!
//! - [`HookEngine`] - The service object owning all dispatch state
//! - [`Callback`] / [`CallbackId`] - Invocables and the identity used for
//!   dedup, removal, and lookup
//! - [`HookRegistry`](registry::HookRegistry) - Ordered callback storage
//! - [`RunCounter`](counter::RunCounter) - Per-event trigger counts
//! - [`CurrentHookContext`](context::CurrentHookContext) - What is
//!   executing right now
//! - [`ALL_HOOK`] - The reserved meta-event observing every dispatch
//!
//! # Example
//!
//! ```
//! use tapline::{Callback, HookEngine};
//! use serde_json::Value;
//!
//! let engine = HookEngine::new();
//!
//! engine.register_with("title", Callback::named("shout", |args: &[Value]| {
//!     let s = args[0].as_str().unwrap_or_default();
//!     Ok(Value::String(s.to_uppercase()))
//! }), 10, 1);
//!
//! engine.register_with("title", Callback::named("bang", |args: &[Value]| {
//!     let s = args[0].as_str().unwrap_or_default();
//!     Ok(Value::String(format!("{s}!")))
//! }), 20, 1);
//!
//! let out = engine.apply_filter("title", Value::from("hello"), &[]).unwrap();
//! assert_eq!(out, Value::from("HELLO!"));
//! ```

/// Callback identity and invocable values.
pub mod callback;

/// Introspection state for in-flight dispatches.
pub mod context;

/// Per-event run counters.
pub mod counter;

/// Triggering: actions, filter chains, and the meta-event pass.
pub mod dispatch;

/// The hook engine service object.
pub mod engine;

/// Error type for dispatch failures.
pub mod error;

/// Ordered callback storage per event name.
pub mod registry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::callback::{Callback, CallbackError, CallbackId, InstanceId, OpaqueId};
    pub use crate::context::CurrentHookContext;
    pub use crate::counter::{DispatchKind, RunCounter};
    pub use crate::dispatch::ALL_HOOK;
    pub use crate::engine::HookEngine;
    pub use crate::error::DispatchError;
    pub use crate::registry::{CallbackEntry, DEFAULT_PRIORITY, HookRegistry};
}

// Re-export key types at crate root for convenience
pub use callback::{Callback, CallbackId};
pub use counter::DispatchKind;
pub use dispatch::ALL_HOOK;
pub use engine::HookEngine;
pub use error::DispatchError;
pub use registry::DEFAULT_PRIORITY;
