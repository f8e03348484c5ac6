//! Per-request authentication.
//!
//! [`RequestAuthenticator`] applies the method policy:
//!
//! | Method | Requirement |
//! |--------|-------------|
//! | `GET` | registered API key |
//! | `POST`, `PUT`, `DELETE` | registered API key and a valid `Signature` envelope |
//! | anything else | rejected |
//!
//! The API key lookup always happens first, so an unknown key is reported as
//! such regardless of the method.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::clock::unix_now;
use crate::credentials::CredentialProvider;
use crate::error::{AuthError, PublicErrorCode};
use crate::signer::MessageValidator;

/// How the method policy treats an HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    /// Retrieval; the API key alone is enough.
    ReadOnly,
    /// Create/update/delete; a signature is required.
    Mutating,
    /// Not accepted by the gateway.
    Unsupported,
}

impl MethodClass {
    /// Classify an HTTP method.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquidgate_auth::MethodClass;
    ///
    /// assert_eq!(MethodClass::of(&http::Method::GET), MethodClass::ReadOnly);
    /// assert_eq!(MethodClass::of(&http::Method::PUT), MethodClass::Mutating);
    /// assert_eq!(MethodClass::of(&http::Method::PATCH), MethodClass::Unsupported);
    /// ```
    #[must_use]
    pub fn of(method: &http::Method) -> Self {
        match *method {
            http::Method::GET => Self::ReadOnly,
            http::Method::POST | http::Method::PUT | http::Method::DELETE => Self::Mutating,
            _ => Self::Unsupported,
        }
    }
}

/// The inputs the authenticator needs from an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    /// HTTP method.
    pub method: &'a http::Method,
    /// Value of the API key header, if any.
    pub api_key: Option<&'a str>,
    /// Value of the `Signature` header, if any.
    pub signature: Option<&'a str>,
    /// Raw request body.
    pub body: &'a [u8],
}

impl<'a> AuthRequest<'a> {
    /// Bundle request inputs.
    #[must_use]
    pub fn new(
        method: &'a http::Method,
        api_key: Option<&'a str>,
        signature: Option<&'a str>,
        body: &'a [u8],
    ) -> Self {
        Self {
            method,
            api_key,
            signature,
            body,
        }
    }
}

/// A successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    /// The API key that authenticated.
    pub api_key: String,
    /// Partner the API key belongs to.
    pub partner_id: String,
    /// Timestamp of the verified envelope; `None` for unsigned reads.
    pub signature_timestamp: Option<i64>,
}

impl AuthDecision {
    /// Whether the request carried a verified signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature_timestamp.is_some()
    }
}

/// A failed authentication with the metadata available at the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Why the request was rejected.
    pub reason: AuthError,
    /// Partner of the API key, when the key was known.
    pub partner_id: Option<String>,
}

impl Rejection {
    fn new(reason: AuthError, partner_id: Option<&str>) -> Self {
        Self {
            reason,
            partner_id: partner_id.map(ToOwned::to_owned),
        }
    }

    /// The error code reported to the client.
    #[must_use]
    pub fn public_code(&self) -> PublicErrorCode {
        self.reason.public_code()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.reason, f)
    }
}

/// Authenticates inbound requests against a credential provider.
///
/// Holds no mutable state; one instance serves all requests concurrently.
#[derive(Clone)]
pub struct RequestAuthenticator {
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("credentials", &"...")
            .finish()
    }
}

impl RequestAuthenticator {
    /// Create an authenticator reading from `credentials`.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// Authenticate at the current wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] describing why the request was refused.
    pub fn authenticate(&self, request: &AuthRequest<'_>) -> Result<AuthDecision, Rejection> {
        self.authenticate_at(request, unix_now())
    }

    /// Authenticate with an explicit verification time.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] describing why the request was refused.
    pub fn authenticate_at(
        &self,
        request: &AuthRequest<'_>,
        now: i64,
    ) -> Result<AuthDecision, Rejection> {
        let api_key = request.api_key.unwrap_or_default();
        let credential = self
            .credentials
            .get_credential(api_key)
            .map_err(|err| Rejection::new(err, None))?;
        let partner_id = credential.partner_id();

        let signature_timestamp = match MethodClass::of(request.method) {
            MethodClass::ReadOnly => None,
            MethodClass::Mutating => {
                let envelope = request.signature.unwrap_or_default();
                let verified = credential
                    .verify(request.body, envelope, now)
                    .map_err(|err| Rejection::new(err, Some(partner_id)))?;
                Some(verified.timestamp)
            }
            MethodClass::Unsupported => {
                return Err(Rejection::new(
                    AuthError::MethodNotAllowed(request.method.to_string()),
                    Some(partner_id),
                ));
            }
        };

        debug!(
            partner_id,
            method = %request.method,
            signed = signature_timestamp.is_some(),
            "Request authenticated"
        );

        Ok(AuthDecision {
            api_key: credential.api_key().to_owned(),
            partner_id: partner_id.to_owned(),
            signature_timestamp,
        })
    }
}
