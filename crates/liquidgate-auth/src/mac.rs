//! HMAC-SHA256 digests over canonical forms.
//!
//! Digests are transported base64-encoded with the standard alphabet and
//! padding. Comparison happens on the encoded text in constant time.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute `Base64(HMAC-SHA256(secret, canonical))`.
///
/// # Examples
///
/// ```
/// use liquidgate_auth::mac::sign;
///
/// let digest = sign(b"{PARTNERID:500001,PAYEE:PAYEELIQUID,CRN:12345}:1686751618", b"hello");
/// assert_eq!(digest, "dYeXj/EbRkYcXlPE8tMSVjMzV4hyt/ha4W0Lj2adPd8=");
/// ```
#[must_use]
pub fn sign(canonical: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can accept keys of any length");
    mac.update(canonical);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Recompute the digest of `canonical` and compare it with `digest`.
#[must_use]
pub fn verify(canonical: &[u8], secret: &[u8], digest: &str) -> bool {
    let expected = sign(canonical, secret);
    expected.as_bytes().ct_eq(digest.as_bytes()).into()
}
