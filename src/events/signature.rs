//! Webhook signature verification using HMAC-SHA1.
//!
//! GitHub signs webhook payloads with a shared secret and delivers the proof
//! in the `X-Hub-Signature` header as `sha1=<hex-digest>`. Verification is a
//! pure function of the payload bytes, the secret, and the header value;
//! [`classify_signature`] computes the outcome and [`verify_event`] adds the
//! audit logging required around it.
//!
//! The digest comparison is constant-time (via the HMAC library's
//! `verify_slice`); a byte-by-byte comparison that short-circuits on the
//! first mismatch would leak timing information.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::events::info::EventInfo;
use crate::logfile::ActivityLog;

type HmacSha1 = Hmac<Sha1>;

/// The only signature algorithm this receiver knows how to verify.
const SHA1_ALGORITHM: &str = "sha1";

/// Outcome of verifying one delivery's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Signature present, supported, and matching the payload.
    Verified,

    /// No signature header on the request. Rejected with 403.
    MissingSignature,

    /// Signature header present but not in `sha1=<hex>` form (unknown
    /// algorithm, or no `=` separator at all). Rejected with 501.
    UnsupportedAlgorithm,

    /// Well-formed sha1 signature that does not match the payload.
    /// Rejected with 403.
    Mismatch,
}

impl VerificationOutcome {
    /// Returns true for [`VerificationOutcome::Verified`].
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified)
    }

    /// The HTTP status the caller must reject with, or `None` when the
    /// pipeline may proceed.
    pub fn reject_status(&self) -> Option<u16> {
        match self {
            VerificationOutcome::Verified => None,
            VerificationOutcome::MissingSignature => Some(403),
            VerificationOutcome::UnsupportedAlgorithm => Some(501),
            VerificationOutcome::Mismatch => Some(403),
        }
    }
}

/// Computes the HMAC-SHA1 signature of a payload using the given secret.
///
/// This is useful for testing purposes (generating expected signatures).
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as an `X-Hub-Signature` header value (`sha1=<hex>`).
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{}={}", SHA1_ALGORITHM, hex::encode(signature))
}

/// Classifies a delivery's signature against the payload and secret.
///
/// Pure: the same `(payload, secret, header)` always yields the same outcome,
/// and no input causes a panic.
///
/// The header is split on the *first* `=` into `(algorithm, digest)`; a
/// header with no `=` at all is treated as an unsupported algorithm rather
/// than crashing on a malformed-but-present value. A digest that is not valid
/// hex can never match and classifies as [`VerificationOutcome::Mismatch`].
///
/// # Examples
///
/// ```
/// use hookmill::events::{classify_signature, compute_signature,
///     format_signature_header, VerificationOutcome};
///
/// let payload = b"Hello, World!";
/// let secret = b"It's a Secret to Everybody";
/// let header = format_signature_header(&compute_signature(payload, secret));
///
/// assert_eq!(
///     classify_signature(payload, secret, Some(&header)),
///     VerificationOutcome::Verified
/// );
/// assert_eq!(
///     classify_signature(payload, b"wrong-secret", Some(&header)),
///     VerificationOutcome::Mismatch
/// );
/// assert_eq!(
///     classify_signature(payload, secret, None),
///     VerificationOutcome::MissingSignature
/// );
/// assert_eq!(
///     classify_signature(payload, secret, Some("md5=abcd")),
///     VerificationOutcome::UnsupportedAlgorithm
/// );
/// ```
pub fn classify_signature(
    payload: &[u8],
    secret: &[u8],
    header: Option<&str>,
) -> VerificationOutcome {
    let Some(header) = header else {
        return VerificationOutcome::MissingSignature;
    };

    let Some((algorithm, digest)) = header.split_once('=') else {
        return VerificationOutcome::UnsupportedAlgorithm;
    };

    if algorithm != SHA1_ALGORITHM {
        return VerificationOutcome::UnsupportedAlgorithm;
    }

    let Ok(expected) = hex::decode(digest) else {
        return VerificationOutcome::Mismatch;
    };

    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return VerificationOutcome::Mismatch,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library.
    if mac.verify_slice(&expected).is_ok() {
        VerificationOutcome::Verified
    } else {
        VerificationOutcome::Mismatch
    }
}

/// Verifies one delivery and logs the outcome before returning it.
///
/// Every outcome leaves an activity-log line (info for verified, warning for
/// the three failure kinds) so an operator can audit rejected deliveries
/// without relying on the HTTP response alone.
pub fn verify_event(
    info: &EventInfo,
    secret: &[u8],
    activity_log: &ActivityLog,
) -> VerificationOutcome {
    let outcome = classify_signature(&info.raw_data, secret, info.signature.as_deref());

    match outcome {
        VerificationOutcome::Verified => {
            activity_log.log("Request verified: signature OK!");
        }
        VerificationOutcome::MissingSignature => {
            activity_log.warning("Missing signature in request header => 403");
        }
        VerificationOutcome::UnsupportedAlgorithm => {
            let signature_type = info
                .signature
                .as_deref()
                .map(|header| header.split_once('=').map_or(header, |(algo, _)| algo))
                .unwrap_or("");
            activity_log.warning(&format!(
                "Unsupported type of signature ({signature_type}) => 501"
            ));
        }
        VerificationOutcome::Mismatch => {
            activity_log.warning("Faulty signature in request header => 403");
        }
    }

    outcome
}
