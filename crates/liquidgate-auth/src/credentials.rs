//! Partner credentials and the registry that serves them.
//!
//! The [`CredentialRegistry`] is read on every request and replaced wholesale
//! by a refresh task. Readers load the current map through an [`ArcSwap`], so
//! the read path takes no lock and never observes a half-built map; a refresh
//! builds the next map off to the side and publishes it with one pointer swap.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use crate::error::AuthError;

/// A partner's API key, shared secret and replay-window policy.
///
/// Immutable once built. The secret is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    api_key: String,
    secret: Vec<u8>,
    partner_id: String,
    max_skew: Duration,
}

impl Credential {
    /// Create a new credential.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        partner_id: impl Into<String>,
        max_skew: Duration,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            partner_id: partner_id.into(),
            max_skew,
        }
    }

    /// The API key that identifies this partner.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The shared HMAC secret.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// The partner identifier reported in logs.
    #[must_use]
    pub fn partner_id(&self) -> &str {
        &self.partner_id
    }

    /// Maximum distance between a signature timestamp and verification time.
    #[must_use]
    pub fn max_skew(&self) -> Duration {
        self.max_skew
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .field("partner_id", &self.partner_id)
            .field("max_skew", &self.max_skew)
            .finish()
    }
}

/// Trait for looking up credentials by API key.
///
/// Lookups must be cheap; they run on every request.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the credential registered for `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownApiKey`] if the key is not registered.
    fn get_credential(&self, api_key: &str) -> Result<Arc<Credential>, AuthError>;
}

type CredentialMap = HashMap<String, Arc<Credential>>;

/// Lock-free, wholesale-replaceable credential store.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use liquidgate_auth::{Credential, CredentialProvider, CredentialRegistry};
///
/// let registry = CredentialRegistry::new();
/// registry.replace(vec![Credential::new("key", "secret", "500001", Duration::from_secs(600))]);
///
/// let credential = registry.get_credential("key").unwrap();
/// assert_eq!(credential.partner_id(), "500001");
/// assert!(registry.get_credential("other").is_err());
/// ```
pub struct CredentialRegistry {
    current: ArcSwap<CredentialMap>,
}

impl CredentialRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(CredentialMap::new()),
        }
    }

    /// Create a registry pre-populated with `credentials`.
    #[must_use]
    pub fn from_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        Self {
            current: ArcSwap::from_pointee(build_map(credentials)),
        }
    }

    /// Publish a new credential set, replacing the previous one atomically.
    ///
    /// When two credentials share an API key the later one wins. Returns the
    /// number of distinct API keys now registered.
    pub fn replace(&self, credentials: impl IntoIterator<Item = Credential>) -> usize {
        let next = Arc::new(build_map(credentials));
        let count = next.len();
        let previous = self.current.swap(next);
        info!(
            previous = previous.len(),
            current = count,
            "Credential registry replaced"
        );
        count
    }

    /// Look up a credential without going through the error type.
    #[must_use]
    pub fn get(&self, api_key: &str) -> Option<Arc<Credential>> {
        self.current.load().get(api_key).cloned()
    }

    /// The currently published map.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<String, Arc<Credential>>> {
        self.current.load_full()
    }

    /// Number of registered API keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Whether no API key is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for CredentialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl CredentialProvider for CredentialRegistry {
    fn get_credential(&self, api_key: &str) -> Result<Arc<Credential>, AuthError> {
        self.get(api_key).ok_or(AuthError::UnknownApiKey)
    }
}

fn build_map(credentials: impl IntoIterator<Item = Credential>) -> CredentialMap {
    let mut map = CredentialMap::new();
    for credential in credentials {
        let key = credential.api_key.clone();
        if map.insert(key, Arc::new(credential)).is_some() {
            debug!("Duplicate API key in credential set, keeping the later entry");
        }
    }
    map
}
