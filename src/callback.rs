//! Callback identity and invocable values.
//!
//! Registration, removal, and lookup all need to recognize "the same
//! callback" without comparing executable values structurally. [`CallbackId`]
//! is that recognition value: a tagged union computed once when a
//! [`Callback`] is constructed and reused for every dedup, remove, and has
//! comparison afterwards.
//!
//! # Identity Variants
//!
//! - [`CallbackId::Named`]: a free function referenced by name. Two named
//!   callbacks with the same name are the same callback.
//! - [`CallbackId::Bound`]: an object instance plus a method name. Equal only
//!   when both the instance (by allocation address) and the method name match.
//! - [`CallbackId::Opaque`]: a closure with no intrinsic name. Equal only to
//!   itself; two separately constructed closures are never equal, even when
//!   their bodies are identical.
//!
//! # Example
//!
//! ```
//! use tapline::callback::Callback;
//! use serde_json::Value;
//!
//! let cb = Callback::named("uppercase", |args: &[Value]| {
//!     let s = args[0].as_str().unwrap_or_default();
//!     Ok(Value::String(s.to_uppercase()))
//! });
//!
//! let again = Callback::named("uppercase", |_: &[Value]| Ok(Value::Null));
//! assert_eq!(cb.id(), again.id());
//! ```

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

// ─────────────────────────────────────────────────────────────────────────────
// Invocable types
// ─────────────────────────────────────────────────────────────────────────────

/// Error produced by a failing callback.
///
/// Callbacks report faults with whatever error type suits them; the engine
/// carries the value to the triggering caller unchanged, as the source of a
/// [`DispatchError`](crate::error::DispatchError).
pub type CallbackError = Box<dyn core::error::Error + Send + Sync>;

/// Type-erased invocable stored behind every registration.
///
/// The slice layout is decided by the dispatcher: for filters the first
/// element is the value being threaded, for actions it is the first caller
/// argument. Action dispatch discards the `Ok` value.
pub type HookFn = dyn Fn(&[Value]) -> Result<Value, CallbackError> + Send + Sync;

// ─────────────────────────────────────────────────────────────────────────────
// InstanceId / OpaqueId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a shared object instance, derived from its allocation address.
///
/// Two `InstanceId`s are equal exactly when they were taken from clones of
/// the same `Arc` allocation. The id holds no reference of its own, so it is
/// only meaningful while the instance it was taken from is still alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Returns the identity of the given shared instance.
    #[must_use]
    pub fn of<T: ?Sized>(instance: &Arc<T>) -> Self {
        Self(Arc::as_ptr(instance).addr())
    }
}

/// Identity of a single anonymous callback.
///
/// Minted from a process-wide monotonic counter; every mint is distinct from
/// every id minted before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpaqueId(u64);

impl OpaqueId {
    /// Mints a fresh opaque identity.
    #[must_use]
    pub fn mint() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CallbackId
// ─────────────────────────────────────────────────────────────────────────────

/// Identity of a registered callback.
///
/// Computed once at construction and used for every add-dedup, remove, and
/// has-query afterwards. See the [module docs](self) for the equality rules
/// of each variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallbackId {
    /// A free function referenced by name.
    Named(Cow<'static, str>),
    /// A method bound to a specific object instance.
    Bound {
        /// Identity of the receiving instance.
        instance: InstanceId,
        /// Name of the method on that instance.
        method: Cow<'static, str>,
    },
    /// A closure with no intrinsic name.
    Opaque(OpaqueId),
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackId::Named(name) => f.write_str(name),
            CallbackId::Bound { instance, method } => {
                write!(f, "{method}@{:#x}", instance.0)
            }
            CallbackId::Opaque(OpaqueId(id)) => write!(f, "closure#{id}"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callback
// ─────────────────────────────────────────────────────────────────────────────

/// An invocable paired with its identity.
///
/// This is the value callers hand to
/// [`HookEngine::register`](crate::engine::HookEngine::register). Cloning is
/// cheap (the invocable is behind an `Arc`) and clones share one identity,
/// so a kept clone can later be used to remove or look up the registration.
#[derive(Clone)]
pub struct Callback {
    id: CallbackId,
    func: Arc<HookFn>,
}

impl Callback {
    /// Creates a callback identified by a function name.
    pub fn named<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        Self::from_parts(CallbackId::Named(name.into()), func)
    }

    /// Creates a callback identified by an instance and a method name.
    ///
    /// The instance is captured by identity only; `func` must do the actual
    /// delegation (usually by capturing its own clone of the `Arc`).
    pub fn bound<T: ?Sized, F>(
        instance: &Arc<T>,
        method: impl Into<Cow<'static, str>>,
        func: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        Self::from_parts(
            CallbackId::Bound {
                instance: InstanceId::of(instance),
                method: method.into(),
            },
            func,
        )
    }

    /// Creates a callback with a freshly minted opaque identity.
    ///
    /// Every call produces a distinct identity; keep a clone of the returned
    /// callback (or of its id) if you need to remove it later.
    pub fn anonymous<F>(func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        Self::from_parts(CallbackId::Opaque(OpaqueId::mint()), func)
    }

    /// Creates a callback from an explicit identity and invocable.
    ///
    /// Lower-level constructor behind [`named`](Self::named),
    /// [`bound`](Self::bound), and [`anonymous`](Self::anonymous).
    pub fn from_parts<F>(id: CallbackId, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, CallbackError> + Send + Sync + 'static,
    {
        Self {
            id,
            func: Arc::new(func),
        }
    }

    /// Returns this callback's identity.
    #[must_use]
    pub fn id(&self) -> &CallbackId {
        &self.id
    }

    /// Invokes the callback with an already-adapted argument slice.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, CallbackError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("id", &self.id).finish()
    }
}
