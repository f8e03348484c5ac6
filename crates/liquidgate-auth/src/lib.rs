//! Timestamped HMAC-SHA256 request signatures for Liquidgate.
//!
//! Partners sign the body of every mutating request with a shared secret. The
//! `Signature` header carries an envelope of the form
//!
//! ```text
//! t=<unix-seconds>,<base64(HMAC-SHA256(secret, CANONICAL))>
//! ```
//!
//! where `CANONICAL` is the body filtered down to `[A-Za-z0-9{}:,.]`, followed
//! by `:` and the timestamp, upper-cased. The timestamp must fall inside the
//! partner's replay window.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use liquidgate_auth::{AuthRequest, Credential, CredentialRegistry, RequestAuthenticator};
//! use liquidgate_auth::envelope::sign_message;
//!
//! let registry = Arc::new(CredentialRegistry::new());
//! registry.replace(vec![Credential::new(
//!     "api-key-1",
//!     "hello",
//!     "500001",
//!     Duration::from_secs(600),
//! )]);
//!
//! let body = br#"{"partner_id":"500001"}"#;
//! let envelope = sign_message(body, b"hello", Some(1_686_751_618)).to_string();
//!
//! let authenticator = RequestAuthenticator::new(registry);
//! let method = http::Method::POST;
//! let request = AuthRequest::new(&method, Some("api-key-1"), Some(envelope.as_str()), body);
//! let decision = authenticator.authenticate_at(&request, 1_686_751_700).unwrap();
//! assert_eq!(decision.partner_id, "500001");
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Body canonicalization
//! - [`mac`] - HMAC-SHA256 digest computation and comparison
//! - [`envelope`] - `t=<ts>,<digest>` codec and the verification state machine
//! - [`signer`] - The sign/verify trait bound to a credential
//! - [`credentials`] - Credentials, the provider trait, and the swappable registry
//! - [`authenticator`] - Per-request method policy and decision
//! - [`error`] - Rejection reasons and the public error codes

pub mod authenticator;
pub mod canonical;
pub mod clock;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod mac;
pub mod signer;

pub use authenticator::{AuthDecision, AuthRequest, MethodClass, Rejection, RequestAuthenticator};
pub use credentials::{Credential, CredentialProvider, CredentialRegistry};
pub use envelope::{SignatureEnvelope, sign_message, verify_envelope, verify_envelope_at};
pub use error::{AuthError, EnvelopeFault, PublicErrorCode};
pub use signer::MessageValidator;
