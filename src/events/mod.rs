//! Event verification, archiving, and dispatch.
//!
//! This module is the core of the receiver. For each inbound delivery it:
//!
//! 1. Extracts canonical metadata ([`info`])
//! 2. Archives the raw delivery to disk ([`archive`])
//! 3. Verifies the HMAC-SHA1 signature ([`signature`])
//! 4. Dispatches to the handler registered for the event type ([`registry`])
//!
//! with [`processor`] sequencing the steps and isolating failures so a
//! crashing handler never takes down the listener.

pub mod archive;
pub mod handlers;
pub mod info;
pub mod processor;
pub mod registry;
pub mod signature;

pub use archive::{ArchivedEvent, PersistenceError, persist_event};
pub use info::{
    EventInfo, HEADER_DELIVERY, HEADER_EVENT, HEADER_SIGNATURE, HEADER_TIMESTAMP,
    MalformedRequestError, UNKNOWN_ACTION, extract_event_info,
};
pub use processor::{EventProcessor, PipelineError, ProcessOutcome};
pub use registry::{DispatchOutcome, EventHandler, HandlerError, HandlerRegistry};
pub use signature::{
    VerificationOutcome, classify_signature, compute_signature, format_signature_header,
    verify_event,
};
