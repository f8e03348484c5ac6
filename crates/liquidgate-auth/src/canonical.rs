//! Canonical form of a signed message.
//!
//! The canonical form is what actually gets fed to HMAC:
//!
//! ```text
//! UPPER( filter(body) + ":" + timestamp )
//! ```
//!
//! `filter` keeps only ASCII letters, digits and the five characters `{`, `}`,
//! `:`, `,`, `.`. Quotes, whitespace, and every other byte are dropped, so two
//! JSON encodings of the same object that differ in spacing, quoting, or
//! letter case produce the same signature.

use crate::clock::unix_now;

/// Whether `byte` survives canonicalization.
///
/// # Examples
///
/// ```
/// use liquidgate_auth::canonical::is_retained;
///
/// assert!(is_retained(b'a'));
/// assert!(is_retained(b'{'));
/// assert!(!is_retained(b'"'));
/// assert!(!is_retained(b' '));
/// ```
#[must_use]
pub fn is_retained(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'{' | b'}' | b':' | b',' | b'.')
}

/// Build the canonical form of `body` signed at `timestamp`.
///
/// An empty `timestamp` is replaced with the current Unix time in seconds.
///
/// # Examples
///
/// ```
/// use liquidgate_auth::canonical::canonicalize;
///
/// assert_eq!(
///     canonicalize(br#"{"crn": "12345", "payee": "liquid"}"#, "1686751618"),
///     "{CRN:12345,PAYEE:LIQUID}:1686751618"
/// );
/// ```
#[must_use]
pub fn canonicalize(body: &[u8], timestamp: &str) -> String {
    let fallback;
    let timestamp = if timestamp.is_empty() {
        fallback = unix_now().to_string();
        fallback.as_str()
    } else {
        timestamp
    };

    let mut canonical = String::with_capacity(body.len() + timestamp.len() + 1);
    canonical.extend(
        body.iter()
            .copied()
            .filter(|&b| is_retained(b))
            .map(|b| char::from(b.to_ascii_uppercase())),
    );
    canonical.push(':');
    canonical.push_str(&timestamp.to_uppercase());
    canonical
}

/// A request body together with the time it is signed at.
#[derive(Debug, Clone, Copy)]
pub struct SignedMessage<'a> {
    /// Raw body bytes as received or sent.
    pub body: &'a [u8],
    /// Signing time in Unix seconds; `None` means "now".
    pub timestamp: Option<i64>,
}

impl<'a> SignedMessage<'a> {
    /// A message signed at the current time.
    #[must_use]
    pub fn new(body: &'a [u8]) -> Self {
        Self {
            body,
            timestamp: None,
        }
    }

    /// A message signed at an explicit time.
    #[must_use]
    pub fn at(body: &'a [u8], timestamp: i64) -> Self {
        Self {
            body,
            timestamp: Some(timestamp),
        }
    }

    /// The signing time, resolving `None` to the current time.
    #[must_use]
    pub fn resolved_timestamp(&self) -> i64 {
        self.timestamp.unwrap_or_else(unix_now)
    }

    /// Canonical form using the resolved timestamp.
    #[must_use]
    pub fn canonical_form(&self) -> String {
        canonicalize(self.body, &self.resolved_timestamp().to_string())
    }
}
