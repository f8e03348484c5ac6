//! Where partner credentials come from.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use liquidgate_auth::Credential;
use tracing::debug;

use crate::error::SourceError;
use crate::profile::{credentials_from_profiles, parse_profiles};
use crate::secrets::parse_credential_document;

/// Path of the acquirer listing on the partner-profile service.
pub const ACQUIRERS_PATH: &str = "/v1/profile/acquirers";

/// Default timeout for partner-profile requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A source of the complete partner credential set.
///
/// Every call returns the full set; callers replace the registry wholesale.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Load all usable partner credentials.
    async fn load(&self) -> Result<Vec<Credential>, SourceError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Reads a credential file: a partner-profile array or a secret-store object.
#[derive(Debug, Clone)]
pub struct FileCredentialSource {
    path: PathBuf,
    max_skew: Duration,
}

impl FileCredentialSource {
    /// Create a source reading `path`, stamping every credential with `max_skew`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_skew: Duration) -> Self {
        Self {
            path: path.into(),
            max_skew,
        }
    }
}

#[async_trait]
impl CredentialSource for FileCredentialSource {
    async fn load(&self) -> Result<Vec<Credential>, SourceError> {
        let payload = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let profiles = parse_credential_document(&payload)?;
        debug!(path = %self.path.display(), profiles = profiles.len(), "read partner profiles");
        Ok(credentials_from_profiles(profiles, self.max_skew))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Fetches acquirer profiles from the partner-profile service.
#[derive(Debug, Clone)]
pub struct PartnerProfileSource {
    client: reqwest::Client,
    url: String,
    max_skew: Duration,
}

impl PartnerProfileSource {
    /// Create a source for the service at `base_url`.
    pub fn new(base_url: &str, max_skew: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url, max_skew))
    }

    /// Create a source using an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str, max_skew: Duration) -> Self {
        Self {
            client,
            url: acquirers_url(base_url),
            max_skew,
        }
    }

    /// The full listing URL this source fetches.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CredentialSource for PartnerProfileSource {
    async fn load(&self) -> Result<Vec<Credential>, SourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let payload = response.bytes().await?;
        let profiles = parse_profiles(&payload)?;
        debug!(url = %self.url, profiles = profiles.len(), "fetched partner profiles");
        Ok(credentials_from_profiles(profiles, self.max_skew))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn acquirers_url(base_url: &str) -> String {
    format!("{}{ACQUIRERS_PATH}", base_url.trim_end_matches('/'))
}
