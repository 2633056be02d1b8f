//! Canonical event metadata extracted from an inbound delivery.
//!
//! GitHub webhooks carry their identifying metadata in headers:
//! - `X-GitHub-Event` - Event type (e.g., "issue_comment")
//! - `X-Github-Delivery` - Unique delivery ID (UUID format)
//! - `Timestamp` - Delivery time, epoch milliseconds
//! - `X-Hub-Signature` - HMAC-SHA1 signature (verified elsewhere)
//!
//! [`extract_event_info`] normalizes these plus the payload's `action` field
//! into an [`EventInfo`] value. Extraction is a pure projection of the
//! request: no I/O, no process state, constructed once per delivery and
//! discarded when the request completes.
//!
//! Timestamp-derived fields are computed in UTC. Archive paths are built from
//! them and double as a partition key for later lookup, so they must not vary
//! with the host timezone.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

/// Header name for GitHub event type.
pub const HEADER_EVENT: &str = "X-GitHub-Event";
/// Header name for GitHub delivery ID.
///
/// This is the single supported spelling; `X-Request-Id` is ignored even when
/// present.
pub const HEADER_DELIVERY: &str = "X-Github-Delivery";
/// Header name for the delivery timestamp (epoch milliseconds).
pub const HEADER_TIMESTAMP: &str = "Timestamp";
/// Header name for the payload signature.
pub const HEADER_SIGNATURE: &str = "X-Hub-Signature";

/// Sentinel action recorded when the payload has no usable `action` field.
pub const UNKNOWN_ACTION: &str = "UNKNOWN";

/// Errors raised when a delivery is missing required metadata.
#[derive(Debug, Error)]
pub enum MalformedRequestError {
    /// A required header is absent.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The timestamp header is present but not an integer.
    #[error("timestamp header is not an integer: {0:?}")]
    InvalidTimestamp(String),

    /// The timestamp parses but does not map to a calendar time.
    #[error("timestamp is out of range: {0}")]
    TimestampOutOfRange(i64),
}

/// Canonical metadata for one webhook delivery.
///
/// Immutable once constructed. `raw_headers`, `raw_body`, and `raw_data` keep
/// the original request material: headers and body for the archive, bytes for
/// signature verification.
#[derive(Debug, Clone, PartialEq)]
pub struct EventInfo {
    /// Delivery GUID from the `X-Github-Delivery` header. Used as a log and
    /// archive key; uniqueness is expected from the sender, not enforced here.
    pub id: String,

    /// Event category from the `X-GitHub-Event` header; selects the handler.
    pub event_type: String,

    /// Sub-action from the payload's `action` field, or [`UNKNOWN_ACTION`].
    pub action: String,

    /// Delivery timestamp in epoch milliseconds, as delivered.
    pub timestamp_raw: i64,

    /// Delivery timestamp as a UTC calendar time.
    pub timestamp: DateTime<Utc>,

    /// `YYYY-MM-DD`, derived from `timestamp`.
    pub date: String,

    /// `HH-MM-SS` (colons replaced for filesystem safety), derived from
    /// `timestamp`.
    pub time: String,

    /// Raw `X-Hub-Signature` header value, if present.
    pub signature: Option<String>,

    /// The parsed JSON payload. Opaque to the core beyond the `action` field.
    pub raw_body: serde_json::Value,

    /// The undecoded payload bytes (input to signature verification).
    pub raw_data: Vec<u8>,

    /// The original header mapping, archived verbatim.
    pub raw_headers: BTreeMap<String, String>,
}

/// Extracts canonical event metadata from an inbound request.
///
/// Total for well-formed requests: a missing payload `action` is substituted
/// with [`UNKNOWN_ACTION`], not rejected. Fails only when a required header
/// (`X-Github-Delivery`, `X-GitHub-Event`, `Timestamp`) is absent or the
/// timestamp is not a parseable integer.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use hookmill::events::{extract_event_info, UNKNOWN_ACTION};
///
/// let mut headers = BTreeMap::new();
/// headers.insert("X-GitHub-Event".to_string(), "create".to_string());
/// headers.insert("X-Github-Delivery".to_string(), "d3ed7694".to_string());
/// headers.insert("Timestamp".to_string(), "1645367007403".to_string());
///
/// let info = extract_event_info(&headers, &serde_json::json!({}), b"{}").unwrap();
/// assert_eq!(info.event_type, "create");
/// assert_eq!(info.action, UNKNOWN_ACTION);
/// assert_eq!(info.date, "2022-02-20");
/// assert_eq!(info.time, "14-23-27");
/// ```
pub fn extract_event_info(
    headers: &BTreeMap<String, String>,
    body: &serde_json::Value,
    raw: &[u8],
) -> Result<EventInfo, MalformedRequestError> {
    let id = require_header(headers, HEADER_DELIVERY)?;
    let event_type = require_header(headers, HEADER_EVENT)?;
    let timestamp_header = require_header(headers, HEADER_TIMESTAMP)?;

    let timestamp_raw: i64 = timestamp_header
        .parse()
        .map_err(|_| MalformedRequestError::InvalidTimestamp(timestamp_header.to_string()))?;

    let timestamp = Utc
        .timestamp_millis_opt(timestamp_raw)
        .single()
        .ok_or(MalformedRequestError::TimestampOutOfRange(timestamp_raw))?;

    let action = body
        .get("action")
        .and_then(|v| v.as_str())
        .unwrap_or(UNKNOWN_ACTION)
        .to_string();

    Ok(EventInfo {
        id: id.to_string(),
        event_type: event_type.to_string(),
        action,
        timestamp_raw,
        timestamp,
        date: timestamp.format("%Y-%m-%d").to_string(),
        time: timestamp.format("%H-%M-%S").to_string(),
        signature: get_header(headers, HEADER_SIGNATURE).map(str::to_string),
        raw_body: body.clone(),
        raw_data: raw.to_vec(),
        raw_headers: headers.clone(),
    })
}

/// Looks up a header by name, ASCII-case-insensitively.
///
/// The HTTP layer may normalize header casing (hyper lowercases names), so
/// lookups must not depend on the canonical spelling.
pub fn get_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Looks up a required header, failing with `MissingHeader` when absent.
fn require_header<'a>(
    headers: &'a BTreeMap<String, String>,
    name: &'static str,
) -> Result<&'a str, MalformedRequestError> {
    get_header(headers, name).ok_or(MalformedRequestError::MissingHeader(name))
}
