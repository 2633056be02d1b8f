//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries and runs the event pipeline
//! synchronously: archive, verify, dispatch. The response mirrors the
//! pipeline's terminal state; handler failures have already been logged and
//! swallowed by the processor, so they still answer an empty success body.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, warn};

use super::AppState;
use crate::events::ProcessOutcome;

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "create", "issue_comment")
///   - `X-Github-Delivery`: Unique delivery ID (UUID format)
///   - `Timestamp`: Delivery time, epoch milliseconds
///   - `X-Hub-Signature`: HMAC-SHA1 signature of the payload
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK (empty body): Pipeline completed, or a pipeline step failed and
///   was logged (deliberate: the sender cannot act on a 500 for a webhook)
/// - 400 Bad Request: Missing required header or invalid JSON
/// - 403 Forbidden: Missing or mismatching signature
/// - 501 Not Implemented: Unsupported signature algorithm
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_map = collect_headers(&headers);

    let body_json: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Rejecting delivery with unparseable JSON body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    debug!(bytes = body.len(), "Received webhook delivery");

    match app_state.processor().process(&header_map, &body_json, &body) {
        Ok(ProcessOutcome::Completed) | Ok(ProcessOutcome::Crashed) => {
            (StatusCode::OK, "").into_response()
        }
        Ok(ProcessOutcome::Rejected(status)) => StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        // Only reachable when the processor was built with raise_error,
        // which is a test-harness configuration, not a serving one.
        Err(err) => {
            error!(error = %err, "Event pipeline error propagated to server");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Collects HTTP headers into the string map the pipeline operates on.
///
/// Only headers with valid UTF-8 values are included (hyper has already
/// lowercased the names).
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_headers_keeps_utf8_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", "create".parse().unwrap());
        headers.insert("timestamp", "1645367007403".parse().unwrap());

        let collected = collect_headers(&headers);

        assert_eq!(
            collected.get("x-github-event").map(String::as_str),
            Some("create")
        );
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn collect_headers_empty_map() {
        let collected = collect_headers(&HeaderMap::new());
        assert!(collected.is_empty());
    }
}
