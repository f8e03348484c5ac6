//! The `Signature` header envelope.
//!
//! Wire format (no whitespace, comma is literal):
//!
//! ```text
//! t=<decimal-unix-seconds>,<base64-standard-digest>
//! ```
//!
//! Verification walks a fixed sequence of stages and stops at the first
//! failure:
//!
//! ```text
//! Start -> PrefixChecked -> Split -> TimestampParsed -> WithinWindow
//!       -> DigestRecomputed -> Accepted | Rejected(reason)
//! ```
//!
//! The digest is only computed once every structural and freshness check has
//! passed.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::canonical::{SignedMessage, canonicalize};
use crate::clock::unix_now;
use crate::error::{AuthError, EnvelopeFault};
use crate::mac;

const TIMESTAMP_PREFIX: &str = "t=";
const SEPARATOR: char = ',';

/// A decoded signature envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEnvelope {
    /// Signing time in Unix seconds.
    pub timestamp: i64,
    /// Base64-encoded HMAC-SHA256 digest.
    pub digest: String,
}

impl SignatureEnvelope {
    /// Create an envelope from its parts.
    #[must_use]
    pub fn new(timestamp: i64, digest: impl Into<String>) -> Self {
        Self {
            timestamp,
            digest: digest.into(),
        }
    }
}

impl fmt::Display for SignatureEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TIMESTAMP_PREFIX}{}{SEPARATOR}{}", self.timestamp, self.digest)
    }
}

/// Borrowed view of a structurally valid envelope.
///
/// `timestamp_text` is kept verbatim because the digest is recomputed over the
/// exact characters the client sent, not over a re-rendered integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedEnvelope<'a> {
    /// Timestamp exactly as it appeared on the wire.
    pub timestamp_text: &'a str,
    /// Timestamp parsed as Unix seconds.
    pub timestamp: i64,
    /// Digest part, everything after the first comma.
    pub digest: &'a str,
}

impl ParsedEnvelope<'_> {
    /// Convert into an owned [`SignatureEnvelope`].
    #[must_use]
    pub fn to_envelope(&self) -> SignatureEnvelope {
        SignatureEnvelope::new(self.timestamp, self.digest)
    }
}

/// Stage reached by the verifier, recorded when a rejection is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStage {
    /// Nothing checked yet.
    Start,
    /// The `t=` prefix is present.
    PrefixChecked,
    /// The value was split into timestamp and digest.
    Split,
    /// The timestamp is an integer.
    TimestampParsed,
    /// The timestamp is inside the replay window.
    WithinWindow,
    /// The digest was recomputed and compared.
    DigestRecomputed,
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::PrefixChecked => "prefix_checked",
            Self::Split => "split",
            Self::TimestampParsed => "timestamp_parsed",
            Self::WithinWindow => "within_window",
            Self::DigestRecomputed => "digest_recomputed",
        })
    }
}

/// Decode an envelope, running the structural checks only.
///
/// # Errors
///
/// Returns [`AuthError::MalformedEnvelope`] with the failing [`EnvelopeFault`].
///
/// # Examples
///
/// ```
/// use liquidgate_auth::envelope::parse_envelope;
///
/// let parsed = parse_envelope("t=1686751618,abc=").unwrap();
/// assert_eq!(parsed.timestamp, 1_686_751_618);
/// assert_eq!(parsed.digest, "abc=");
/// ```
pub fn parse_envelope(value: &str) -> Result<ParsedEnvelope<'_>, AuthError> {
    parse_staged(value).map_err(|(_, err)| err)
}

fn parse_staged(value: &str) -> Result<ParsedEnvelope<'_>, (VerificationStage, AuthError)> {
    let rest = value.strip_prefix(TIMESTAMP_PREFIX).ok_or((
        VerificationStage::Start,
        AuthError::MalformedEnvelope(EnvelopeFault::MissingPrefix),
    ))?;

    let (timestamp_text, digest) = rest.split_once(SEPARATOR).ok_or((
        VerificationStage::PrefixChecked,
        AuthError::MalformedEnvelope(EnvelopeFault::MissingSeparator),
    ))?;

    let timestamp = timestamp_text.parse::<i64>().map_err(|_| {
        (
            VerificationStage::Split,
            AuthError::MalformedEnvelope(EnvelopeFault::InvalidTimestamp),
        )
    })?;

    Ok(ParsedEnvelope {
        timestamp_text,
        timestamp,
        digest,
    })
}

/// Check that `timestamp` lies within `max_skew` of `now`, in either direction.
///
/// The bound is inclusive: a distance of exactly `max_skew` is accepted.
///
/// # Errors
///
/// Returns [`AuthError::ReplayWindowExceeded`] for stale and future-dated
/// timestamps alike.
pub fn check_window(timestamp: i64, now: i64, max_skew: Duration) -> Result<(), AuthError> {
    let distance = Duration::from_secs(now.abs_diff(timestamp));
    if distance > max_skew {
        return Err(AuthError::ReplayWindowExceeded { timestamp, now });
    }
    Ok(())
}

/// Verify an envelope against `body` at an explicit verification time.
///
/// # Errors
///
/// Returns the [`AuthError`] of the first stage that fails.
pub fn verify_envelope_at(
    value: &str,
    body: &[u8],
    secret: &[u8],
    max_skew: Duration,
    now: i64,
) -> Result<SignatureEnvelope, AuthError> {
    let parsed = parse_staged(value).map_err(|(stage, err)| reject(stage, err))?;

    check_window(parsed.timestamp, now, max_skew)
        .map_err(|err| reject(VerificationStage::TimestampParsed, err))?;

    let canonical = canonicalize(body, parsed.timestamp_text);
    debug!(
        timestamp = parsed.timestamp,
        canonical_len = canonical.len(),
        "Recomputing envelope digest"
    );

    if mac::verify(canonical.as_bytes(), secret, parsed.digest) {
        debug!(timestamp = parsed.timestamp, "Envelope accepted");
        Ok(parsed.to_envelope())
    } else {
        Err(reject(
            VerificationStage::DigestRecomputed,
            AuthError::SignatureMismatch,
        ))
    }
}

/// Verify an envelope against `body` at the current wall-clock time.
///
/// # Errors
///
/// See [`verify_envelope_at`].
pub fn verify_envelope(
    value: &str,
    body: &[u8],
    secret: &[u8],
    max_skew: Duration,
) -> Result<SignatureEnvelope, AuthError> {
    verify_envelope_at(value, body, secret, max_skew, unix_now())
}

/// Sign `body` with `secret`, using `timestamp` or the current time.
///
/// # Examples
///
/// ```
/// use liquidgate_auth::envelope::sign_message;
///
/// let envelope = sign_message(
///     br#"{"partner_id":"500001","payee":"payeeliquid","crn":"12345"}"#,
///     b"hello",
///     Some(1_686_751_618),
/// );
/// assert_eq!(
///     envelope.to_string(),
///     "t=1686751618,dYeXj/EbRkYcXlPE8tMSVjMzV4hyt/ha4W0Lj2adPd8="
/// );
/// ```
#[must_use]
pub fn sign_message(body: &[u8], secret: &[u8], timestamp: Option<i64>) -> SignatureEnvelope {
    let message = SignedMessage {
        body,
        timestamp,
    };
    let timestamp = message.resolved_timestamp();
    let canonical = canonicalize(body, &timestamp.to_string());
    SignatureEnvelope::new(timestamp, mac::sign(canonical.as_bytes(), secret))
}

fn reject(stage: VerificationStage, err: AuthError) -> AuthError {
    debug!(%stage, reason = err.reason(), error = %err, "Envelope rejected");
    err
}
