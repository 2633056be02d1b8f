//! Stock event handlers.
//!
//! Real deployments register their own business handlers; the receiver ships
//! with a single log-only handler so the binary acknowledges the event types
//! it expects and leaves an audit line for each.

use crate::events::info::EventInfo;
use crate::events::registry::{EventHandler, HandlerError};
use crate::logfile::ActivityLog;

/// Handler that records `<type> event handled!` in the activity log and does
/// nothing else.
///
/// Useful as a placeholder while a real handler for the event type is being
/// written, and as the visible success marker in tests.
pub struct LoggingHandler {
    event_type: String,
    activity_log: ActivityLog,
}

impl LoggingHandler {
    pub fn new(event_type: impl Into<String>, activity_log: ActivityLog) -> Self {
        LoggingHandler {
            event_type: event_type.into(),
            activity_log,
        }
    }
}

impl EventHandler for LoggingHandler {
    fn handle(&self, _event: &EventInfo) -> Result<(), HandlerError> {
        self.activity_log
            .log(&format!("{} event handled!", self.event_type));
        Ok(())
    }
}
