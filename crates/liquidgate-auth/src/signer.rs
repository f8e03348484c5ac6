//! The sign/verify interface bound to a credential.

use crate::credentials::Credential;
use crate::envelope::{SignatureEnvelope, sign_message, verify_envelope_at};
use crate::error::AuthError;

/// Signs request bodies and verifies `Signature` envelopes with one secret and
/// one replay-window policy.
pub trait MessageValidator: Send + Sync {
    /// Sign `body` at `timestamp`, or at the current time when `None`.
    fn sign(&self, body: &[u8], timestamp: Option<i64>) -> SignatureEnvelope;

    /// Verify `envelope` against `body` at verification time `now`.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first failing verification stage.
    fn verify(&self, body: &[u8], envelope: &str, now: i64)
    -> Result<SignatureEnvelope, AuthError>;
}

impl MessageValidator for Credential {
    fn sign(&self, body: &[u8], timestamp: Option<i64>) -> SignatureEnvelope {
        sign_message(body, self.secret(), timestamp)
    }

    fn verify(
        &self,
        body: &[u8],
        envelope: &str,
        now: i64,
    ) -> Result<SignatureEnvelope, AuthError> {
        verify_envelope_at(envelope, body, self.secret(), self.max_skew(), now)
    }
}
