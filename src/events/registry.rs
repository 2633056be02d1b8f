//! Handler registry and event dispatch.
//!
//! Event types map to handlers through an explicit registry populated before
//! the first request is served, replacing any name-convention lookup: a
//! mistyped registration is visible in tests instead of silently matching
//! nothing. The registry is read-only during request processing.
//!
//! An event type with no registered handler is expected operation, not an
//! error: new event types arrive before anyone writes handlers for them, and
//! the system degrades by logging and ignoring. A handler that *fails* is the
//! opposite case: the error propagates untouched so the orchestrator's single
//! failure boundary applies to every handler uniformly.

use std::collections::HashMap;

use thiserror::Error;

use crate::events::info::EventInfo;
use crate::logfile::ActivityLog;

/// Error reported by a failing event handler.
///
/// Handlers are external business logic; their failures are carried as a
/// message and absorbed at the orchestrator boundary.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        HandlerError(message.into())
    }
}

/// A per-event-type handler capability.
///
/// Implementations receive the full [`EventInfo`] (including the opaque
/// payload) and perform whatever business action the event calls for.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &EventInfo) -> Result<(), HandlerError>;
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler was registered for the event type and ran to completion.
    Handled,

    /// No handler registered for the event type; logged and ignored.
    Unhandled,
}

/// Mapping from event-type string to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        HandlerRegistry::default()
    }

    /// Registers `handler` for `event_type`, replacing any previous handler
    /// for the same type.
    pub fn register<H>(&mut self, event_type: impl Into<String>, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(event_type.into(), Box::new(handler));
    }

    /// Returns true if a handler is registered for `event_type`.
    pub fn has_handler(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Dispatches an event to the handler registered for its type.
    ///
    /// Lookup is an exact match on `event.event_type`; no prefix or pattern
    /// matching. An unregistered type logs a warning and returns
    /// [`DispatchOutcome::Unhandled`] normally.
    ///
    /// # Errors
    ///
    /// A handler failure propagates as-is; catching it is the orchestrator's
    /// responsibility.
    pub fn dispatch(
        &self,
        event: &EventInfo,
        activity_log: &ActivityLog,
    ) -> Result<DispatchOutcome, HandlerError> {
        match self.handlers.get(&event.event_type) {
            None => {
                activity_log.warning(&format!(
                    "Event (id: {}, type: {}, action: {}) was received but left unhandled!",
                    event.id, event.event_type, event.action,
                ));
                Ok(DispatchOutcome::Unhandled)
            }
            Some(handler) => {
                activity_log.log(&format!(
                    "[event id {}] Handler found for event type '{}' (action: {})",
                    event.id, event.event_type, event.action,
                ));
                handler.handle(event)?;
                Ok(DispatchOutcome::Handled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::info::extract_event_info;
    use serde_json::json;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn test_event(event_type: &str) -> EventInfo {
        let mut headers = std::collections::BTreeMap::new();
        headers.insert("Timestamp".to_string(), "1645367007403".to_string());
        headers.insert("X-GitHub-Event".to_string(), event_type.to_string());
        headers.insert("X-Github-Delivery".to_string(), "id-001".to_string());
        extract_event_info(&headers, &json!({"action": "created"}), b"{}").unwrap()
    }

    /// Counts invocations; fails on demand.
    struct RecordingHandler {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl EventHandler for RecordingHandler {
        fn handle(&self, _event: &EventInfo) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(HandlerError::new("handler exploded"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn unregistered_type_is_unhandled_not_an_error() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.log"));
        let registry = HandlerRegistry::new();

        let outcome = registry.dispatch(&test_event("create"), &log).unwrap();

        assert_eq!(outcome, DispatchOutcome::Unhandled);
        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains(
            "WARNING: Event (id: id-001, type: create, action: created) \
             was received but left unhandled!"
        ));
    }

    #[test]
    fn registered_handler_is_invoked() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.log"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry.register(
            "issue_comment",
            RecordingHandler {
                calls: Arc::clone(&calls),
                fail: false,
            },
        );

        let outcome = registry
            .dispatch(&test_event("issue_comment"), &log)
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("Handler found for event type 'issue_comment'"));
    }

    #[test]
    fn lookup_is_exact_match_only() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.log"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry.register(
            "issue_comment",
            RecordingHandler {
                calls: Arc::clone(&calls),
                fail: false,
            },
        );

        // "issue" is a prefix of a registered type, but must not match.
        let outcome = registry.dispatch(&test_event("issue"), &log).unwrap();

        assert_eq!(outcome, DispatchOutcome::Unhandled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_failure_propagates() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.log"));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry.register(
            "create",
            RecordingHandler {
                calls: Arc::clone(&calls),
                fail: true,
            },
        );

        let err = registry.dispatch(&test_event("create"), &log).unwrap_err();

        assert_eq!(err.to_string(), "handler exploded");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn re_registration_replaces_handler() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.log"));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry.register(
            "create",
            RecordingHandler {
                calls: Arc::clone(&first),
                fail: false,
            },
        );
        registry.register(
            "create",
            RecordingHandler {
                calls: Arc::clone(&second),
                fail: false,
            },
        );

        registry.dispatch(&test_event("create"), &log).unwrap();

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn has_handler_reflects_registration() {
        let mut registry = HandlerRegistry::new();
        assert!(!registry.has_handler("create"));

        let calls = Arc::new(AtomicUsize::new(0));
        registry.register("create", RecordingHandler { calls, fail: false });

        assert!(registry.has_handler("create"));
        assert!(!registry.has_handler("issue_comment"));
    }
}
