//! Error types for request authentication.
//!
//! [`AuthError`] carries the precise rejection reason for logging. Clients only
//! ever see one of the two [`PublicErrorCode`]s, so the finer reason does not
//! leak over the wire.

use std::fmt;

/// The structural check of the signature envelope that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeFault {
    /// The value does not start with `t=`.
    MissingPrefix,
    /// No `,` separates the timestamp from the digest.
    MissingSeparator,
    /// The timestamp part is not a decimal integer.
    InvalidTimestamp,
}

impl fmt::Display for EnvelopeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingPrefix => "missing t= prefix",
            Self::MissingSeparator => "missing comma separator",
            Self::InvalidTimestamp => "timestamp is not an integer",
        })
    }
}

/// Reasons a request fails authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The API key header is absent or not present in the registry.
    #[error("API key is missing or not registered")]
    UnknownApiKey,

    /// The `Signature` header is not a well-formed envelope.
    #[error("malformed signature envelope: {0}")]
    MalformedEnvelope(EnvelopeFault),

    /// The envelope timestamp is too far from the verification time.
    #[error("signature timestamp {timestamp} is outside the replay window (now {now})")]
    ReplayWindowExceeded {
        /// Timestamp carried in the envelope.
        timestamp: i64,
        /// Verification time.
        now: i64,
    },

    /// The recomputed digest differs from the one in the envelope.
    #[error("signature does not match")]
    SignatureMismatch,

    /// The HTTP method is neither read-only nor an accepted mutating verb.
    #[error("method {0} is not allowed")]
    MethodNotAllowed(String),
}

impl AuthError {
    /// The code reported to the client for this rejection.
    #[must_use]
    pub fn public_code(&self) -> PublicErrorCode {
        match self {
            Self::UnknownApiKey | Self::MethodNotAllowed(_) => PublicErrorCode::ApiKeyMissing,
            Self::MalformedEnvelope(_)
            | Self::ReplayWindowExceeded { .. }
            | Self::SignatureMismatch => PublicErrorCode::InvalidSignature,
        }
    }

    /// Short machine-friendly name of the reason, used as a log field.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownApiKey => "unknown_api_key",
            Self::MalformedEnvelope(_) => "malformed_envelope",
            Self::ReplayWindowExceeded { .. } => "replay_window_exceeded",
            Self::SignatureMismatch => "signature_mismatch",
            Self::MethodNotAllowed(_) => "method_not_allowed",
        }
    }
}

/// Error codes that are part of the wire contract with partners.
///
/// The code/description pairs must stay byte-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicErrorCode {
    /// `00400001` - the API key is missing or invalid.
    ApiKeyMissing,
    /// `00400002` - the signature is invalid.
    InvalidSignature,
    /// `00500001` - the gateway failed internally.
    InternalError,
}

impl PublicErrorCode {
    /// The numeric error code string.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::ApiKeyMissing => "00400001",
            Self::InvalidSignature => "00400002",
            Self::InternalError => "00500001",
        }
    }

    /// The human-readable description paired with the code.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::ApiKeyMissing => "Apikey is missing or invalid",
            Self::InvalidSignature => "Invalid signature",
            Self::InternalError => "Internal system error",
        }
    }
}
