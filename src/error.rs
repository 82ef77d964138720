//! Error type for dispatch failures.

use crate::callback::{CallbackError, CallbackId};

/// A registered callback failed during dispatch.
///
/// This is the only error a trigger can produce: unknown events and empty
/// hooks are no-ops, not failures. The callback's own error is preserved
/// unchanged as the [`source`](core::error::Error::source); the engine adds
/// which event was being dispatched and which callback failed, and
/// guarantees the current-hook bookkeeping was unwound before this value
/// reached the caller.
#[derive(Debug, thiserror::Error)]
#[error("callback '{callback}' failed while dispatching '{event}'")]
pub struct DispatchError {
    event: String,
    callback: CallbackId,
    #[source]
    source: CallbackError,
}

impl DispatchError {
    pub(crate) fn new(event: &str, callback: CallbackId, source: CallbackError) -> Self {
        Self {
            event: event.to_owned(),
            callback,
            source,
        }
    }

    /// Returns the event that was being dispatched.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Returns the identity of the callback that failed.
    #[must_use]
    pub fn callback(&self) -> &CallbackId {
        &self.callback
    }

    /// Consumes the error, returning the callback's original fault.
    #[must_use]
    pub fn into_source(self) -> CallbackError {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{CallbackId, OpaqueId};
    use core::error::Error;

    #[test]
    fn message_names_event_and_callback() {
        let err = DispatchError::new(
            "save_post",
            CallbackId::Named("validate".into()),
            "value out of range".into(),
        );

        assert_eq!(
            err.to_string(),
            "callback 'validate' failed while dispatching 'save_post'"
        );
        assert_eq!(err.event(), "save_post");
        assert_eq!(err.source().unwrap().to_string(), "value out of range");
    }

    #[test]
    fn into_source_returns_the_original_fault() {
        let id = CallbackId::Opaque(OpaqueId::mint());
        let err = DispatchError::new("init", id.clone(), "boom".into());

        assert_eq!(err.callback(), &id);
        assert_eq!(err.into_source().to_string(), "boom");
    }
}
