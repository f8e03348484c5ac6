//! Partner profile records.

use std::time::Duration;

use liquidgate_auth::Credential;
use serde::Deserialize;
use tracing::warn;

use crate::error::SourceError;

/// A partner profile as served by the profile service.
///
/// Only the fields the gateway needs are kept; everything else in the record
/// (fees, settlement settings, webhooks) is ignored.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerProfile {
    /// Acquirer identifier.
    #[serde(default)]
    pub acq_id: String,
    /// Partner display name, used as the partner id.
    #[serde(default)]
    pub name: String,
    /// API key the partner sends.
    #[serde(default)]
    pub api_key: String,
    /// Shared signing secret.
    #[serde(default)]
    pub secret: String,
}

impl std::fmt::Debug for PartnerProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartnerProfile")
            .field("acq_id", &self.acq_id)
            .field("name", &self.name)
            .field("api_key", &self.api_key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl PartnerProfile {
    /// Partner id for logging: the name, or the acquirer id when unnamed.
    #[must_use]
    pub fn partner_id(&self) -> &str {
        if self.name.is_empty() {
            &self.acq_id
        } else {
            &self.name
        }
    }

    /// Convert into a credential, or `None` if the key or secret is empty.
    #[must_use]
    pub fn into_credential(self, max_skew: Duration) -> Option<Credential> {
        if self.api_key.is_empty() || self.secret.is_empty() {
            return None;
        }
        let partner_id = self.partner_id().to_owned();
        Some(Credential::new(
            self.api_key,
            self.secret.into_bytes(),
            partner_id,
            max_skew,
        ))
    }
}

/// Parse a JSON array of partner profiles.
pub fn parse_profiles(payload: &[u8]) -> Result<Vec<PartnerProfile>, SourceError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Convert profiles into credentials, skipping unusable entries.
pub fn credentials_from_profiles(
    profiles: Vec<PartnerProfile>,
    max_skew: Duration,
) -> Vec<Credential> {
    profiles
        .into_iter()
        .filter_map(|profile| {
            let partner_id = profile.partner_id().to_owned();
            let credential = profile.into_credential(max_skew);
            if credential.is_none() {
                warn!(
                    partner_id = %partner_id,
                    "skipping partner profile without api key or secret"
                );
            }
            credential
        })
        .collect()
}
