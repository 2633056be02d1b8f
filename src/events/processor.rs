//! Per-request event processing pipeline.
//!
//! [`EventProcessor`] sequences the pipeline for one inbound delivery:
//! extract, archive, verify, dispatch. Each request terminates in one of
//! three states:
//!
//! - `Completed` - the pipeline ran to the end (handled or unhandled).
//! - `Rejected(status)` - extraction or verification failed; the caller must
//!   answer with the given HTTP status and nothing further runs.
//! - `Crashed` - archiving or a handler failed; the failure was logged with
//!   its full error chain and the caller still answers an empty success
//!   response.
//!
//! The catch-and-log terminal state is deliberate availability policy, not an
//! accident: the sender cannot act on a 500 for a webhook, so once a delivery
//! is authenticated the receiver always acknowledges it and pushes failure
//! diagnosis into the operator-facing log. Archiving runs *before*
//! verification so that rejected deliveries (including attack attempts) are
//! still forensically recoverable.
//!
//! Test harnesses set `raise_error` to propagate pipeline failures instead of
//! swallowing them, so suites can assert on the failure content directly.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::Secrets;
use crate::events::archive::{PersistenceError, persist_event};
use crate::events::info::extract_event_info;
use crate::events::registry::{HandlerError, HandlerRegistry};
use crate::events::signature::verify_event;
use crate::logfile::ActivityLog;

/// A failure inside the archive or dispatch steps.
///
/// Only observable by callers when `raise_error` is enabled; otherwise it is
/// converted into the `Crashed` outcome at the pipeline boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Archiving the delivery failed.
    #[error("failed to archive event")]
    Persistence(#[from] PersistenceError),

    /// A dispatched handler failed.
    #[error("event handler failed")]
    Handler(#[from] HandlerError),
}

/// Terminal state of one processed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Pipeline ran to completion; answer an empty success response.
    Completed,

    /// Request rejected before dispatch; answer with this HTTP status.
    Rejected(u16),

    /// A pipeline step failed and was logged; still answer an empty success
    /// response.
    Crashed,
}

/// Orchestrator for the verification, archiving, and dispatch pipeline.
///
/// One processor serves all requests; it holds only read-only state (the
/// registry, the secrets, the archive root) plus the append-only activity
/// log, so concurrent requests need no synchronization.
pub struct EventProcessor {
    registry: HandlerRegistry,
    secrets: Secrets,
    events_log_dir: PathBuf,
    activity_log: ActivityLog,
    verify: bool,
    raise_error: bool,
}

impl EventProcessor {
    /// Creates a processor with verification enabled and error-swallowing
    /// (production) failure policy.
    pub fn new(
        registry: HandlerRegistry,
        secrets: Secrets,
        events_log_dir: impl Into<PathBuf>,
        activity_log: ActivityLog,
    ) -> Self {
        EventProcessor {
            registry,
            secrets,
            events_log_dir: events_log_dir.into(),
            activity_log,
            verify: true,
            raise_error: false,
        }
    }

    /// Enables or disables signature verification.
    ///
    /// Disabling is intended for tests and trusted internal replay only.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// When set, pipeline failures propagate to the caller instead of being
    /// logged and swallowed. For test harnesses.
    pub fn with_raise_error(mut self, raise_error: bool) -> Self {
        self.raise_error = raise_error;
        self
    }

    /// Returns the activity log this processor writes to.
    pub fn activity_log(&self) -> &ActivityLog {
        &self.activity_log
    }

    /// Processes one inbound delivery.
    ///
    /// # Errors
    ///
    /// Returns `Err` only when `raise_error` is enabled; otherwise every
    /// failure maps to a [`ProcessOutcome`].
    pub fn process(
        &self,
        headers: &BTreeMap<String, String>,
        body: &serde_json::Value,
        raw: &[u8],
    ) -> Result<ProcessOutcome, PipelineError> {
        // Extraction failure is the one pre-pipeline rejection: there is no
        // partial processing of a request we cannot even identify.
        let info = match extract_event_info(headers, body, raw) {
            Ok(info) => info,
            Err(err) => {
                self.activity_log
                    .warning(&format!("Malformed request rejected => 400 ({err})"));
                return Ok(ProcessOutcome::Rejected(400));
            }
        };

        match self.run_pipeline(&info) {
            Ok(outcome) => Ok(outcome),
            Err(err) if self.raise_error => Err(err),
            Err(err) => {
                self.activity_log
                    .warning(&format!("A crash occurred!\n{}", render_error_chain(&err)));
                Ok(ProcessOutcome::Crashed)
            }
        }
    }

    /// Runs archive, verification, and dispatch for an extracted event.
    fn run_pipeline(
        &self,
        info: &crate::events::info::EventInfo,
    ) -> Result<ProcessOutcome, PipelineError> {
        persist_event(info, &self.events_log_dir, &self.activity_log)?;

        if self.verify {
            let outcome = verify_event(
                info,
                self.secrets.webhook_secret.as_bytes(),
                &self.activity_log,
            );
            if let Some(status) = outcome.reject_status() {
                return Ok(ProcessOutcome::Rejected(status));
            }
        }

        self.registry.dispatch(info, &self.activity_log)?;
        Ok(ProcessOutcome::Completed)
    }
}

/// Renders an error and its full source chain, one cause per line.
fn render_error_chain(err: &dyn std::error::Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str("\ncaused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
