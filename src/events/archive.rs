//! On-disk archive of processed deliveries.
//!
//! Every delivery is persisted as two pretty-printed, sorted-keys JSON files
//! (headers and body) under a deterministic path:
//!
//! ```text
//! <events_log_dir>/<type>/<action>/<date>/<date>T<time>_<id>_headers.json
//! <events_log_dir>/<type>/<action>/<date>/<date>T<time>_<id>_body.json
//! ```
//!
//! The path components come from UTC-derived [`EventInfo`] fields, so the
//! layout doubles as a partition key for later lookup. Directory creation is
//! recursive and idempotent; writing the same path twice overwrites silently
//! (last-write-wins, no dedup by delivery id). Concurrent writes to different
//! paths never collide; same-path races are acceptable because delivery ids
//! are expected to be unique.
//!
//! Failures always surface as [`PersistenceError`] here. Swallowing is the
//! orchestrator's job, one level up.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::events::info::EventInfo;
use crate::logfile::ActivityLog;

/// Errors that can occur while archiving a delivery.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO error during directory creation or file writes.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path component (id, type, or action) contains unsafe characters.
    #[error("unsafe archive path component: {0:?}")]
    UnsafePathComponent(String),
}

/// Locations of the two artifacts written for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedEvent {
    /// Path of the `_headers.json` artifact.
    pub headers_path: PathBuf,

    /// Path of the `_body.json` artifact.
    pub body_path: PathBuf,
}

/// Persists one delivery to the archive and appends an activity-log line.
///
/// # Errors
///
/// Returns `PersistenceError` when the target directory cannot be created or
/// written (permissions, full filesystem) or a path component is unsafe.
pub fn persist_event(
    info: &EventInfo,
    events_log_dir: &Path,
    activity_log: &ActivityLog,
) -> Result<ArchivedEvent, PersistenceError> {
    // id, type, and action originate from the request; keep them from
    // escaping the archive tree.
    validate_path_component(&info.id)?;
    validate_path_component(&info.event_type)?;
    validate_path_component(&info.action)?;

    let event_dir = events_log_dir
        .join(&info.event_type)
        .join(&info.action)
        .join(&info.date);
    fs::create_dir_all(&event_dir)?;

    let stem = format!("{}T{}_{}", info.date, info.time, info.id);
    let headers_path = event_dir.join(format!("{stem}_headers.json"));
    let body_path = event_dir.join(format!("{stem}_body.json"));

    write_json_artifact(&headers_path, &info.raw_headers)?;
    write_json_artifact(&body_path, &info.raw_body)?;

    activity_log.log(&format!(
        "Event received (id: {}, type: {}, action: {}), event data logged at {}",
        info.id,
        info.event_type,
        info.action,
        event_dir.join(stem).display(),
    ));

    Ok(ArchivedEvent {
        headers_path,
        body_path,
    })
}

/// Writes one pretty-printed JSON artifact, overwriting any previous one.
///
/// serde_json's default map representation is a `BTreeMap`, so keys come out
/// sorted regardless of the order they arrived in.
fn write_json_artifact<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), PersistenceError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Validates that a request-supplied value is safe to use as a path component.
///
/// Rejects empty values, path separators, null bytes, and leading dots
/// (hidden files, `.`/`..` traversal).
fn validate_path_component(component: &str) -> Result<(), PersistenceError> {
    if component.is_empty()
        || component.contains('/')
        || component.contains('\\')
        || component.contains('\0')
        || component.starts_with('.')
    {
        return Err(PersistenceError::UnsafePathComponent(component.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::info::extract_event_info;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    const TIMESTAMP_001: &str = "1645367007403";
    const REQUEST_ID_001: &str = "d3ed7694-8a6c-4008-a93f-b92aa86a95a8";

    fn test_event(event_type: &str, body: serde_json::Value) -> EventInfo {
        let mut headers = BTreeMap::new();
        headers.insert("Timestamp".to_string(), TIMESTAMP_001.to_string());
        headers.insert("X-GitHub-Event".to_string(), event_type.to_string());
        headers.insert("X-Github-Delivery".to_string(), REQUEST_ID_001.to_string());
        extract_event_info(&headers, &body, b"{}").unwrap()
    }

    fn test_log(dir: &Path) -> ActivityLog {
        ActivityLog::new(dir.join("activity.log"))
    }

    #[test]
    fn persist_writes_both_artifacts_at_expected_path() {
        let dir = tempdir().unwrap();
        let info = test_event("create", json!({}));

        let archived = persist_event(&info, dir.path(), &test_log(dir.path())).unwrap();

        let expected_dir = dir.path().join("create").join("UNKNOWN").join("2022-02-20");
        let expected_stem = format!("2022-02-20T14-23-27_{REQUEST_ID_001}");
        assert_eq!(
            archived.headers_path,
            expected_dir.join(format!("{expected_stem}_headers.json"))
        );
        assert_eq!(
            archived.body_path,
            expected_dir.join(format!("{expected_stem}_body.json"))
        );
        assert!(archived.headers_path.exists());
        assert!(archived.body_path.exists());
    }

    #[test]
    fn archived_artifacts_roundtrip() {
        let dir = tempdir().unwrap();
        let body = json!({"action": "created", "comment": {"body": "This is just a test"}});
        let info = test_event("issue_comment", body.clone());

        let archived = persist_event(&info, dir.path(), &test_log(dir.path())).unwrap();

        let headers_back: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&archived.headers_path).unwrap()).unwrap();
        assert_eq!(headers_back, info.raw_headers);

        let body_back: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&archived.body_path).unwrap()).unwrap();
        assert_eq!(body_back, body);
    }

    #[test]
    fn headers_artifact_has_sorted_keys() {
        let dir = tempdir().unwrap();
        let info = test_event("create", json!({}));

        let archived = persist_event(&info, dir.path(), &test_log(dir.path())).unwrap();

        let text = fs::read_to_string(&archived.headers_path).unwrap();
        let timestamp_pos = text.find("\"Timestamp\"").unwrap();
        let event_pos = text.find("\"X-GitHub-Event\"").unwrap();
        let delivery_pos = text.find("\"X-Github-Delivery\"").unwrap();
        assert!(timestamp_pos < event_pos);
        assert!(event_pos < delivery_pos);
    }

    #[test]
    fn persist_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let info = test_event("create", json!({}));
        let log = test_log(dir.path());

        let first = persist_event(&info, dir.path(), &log).unwrap();
        let second = persist_event(&info, dir.path(), &log).unwrap();

        assert_eq!(first, second);
        // Two artifacts, not four: the second write overwrote the first.
        let entries: Vec<_> = fs::read_dir(first.headers_path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn persist_logs_event_received_line() {
        let dir = tempdir().unwrap();
        let info = test_event("create", json!({"action": "created"}));
        let log = test_log(dir.path());

        persist_event(&info, dir.path(), &log).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains(&format!(
            "Event received (id: {REQUEST_ID_001}, type: create, action: created)"
        )));
    }

    #[test]
    fn write_failure_surfaces_as_persistence_error() {
        let dir = tempdir().unwrap();
        // Occupy the event-type path with a regular file so create_dir_all fails.
        fs::write(dir.path().join("create"), b"not a directory").unwrap();
        let info = test_event("create", json!({}));

        let result = persist_event(&info, dir.path(), &test_log(dir.path()));
        assert!(matches!(result, Err(PersistenceError::Io(_))));
    }

    #[test]
    fn traversal_attempts_are_rejected() {
        let dir = tempdir().unwrap();
        let mut info = test_event("create", json!({}));
        info.id = "../escape".to_string();

        let result = persist_event(&info, dir.path(), &test_log(dir.path()));
        assert!(matches!(
            result,
            Err(PersistenceError::UnsafePathComponent(_))
        ));
    }

    #[test]
    fn validate_path_component_rules() {
        assert!(validate_path_component("issue_comment").is_ok());
        assert!(validate_path_component("d3ed7694-8a6c").is_ok());
        assert!(validate_path_component("").is_err());
        assert!(validate_path_component("a/b").is_err());
        assert!(validate_path_component("a\\b").is_err());
        assert!(validate_path_component(".hidden").is_err());
        assert!(validate_path_component("..").is_err());
        assert!(validate_path_component("a\0b").is_err());
    }
}
