//! Secret-store credential documents.
//!
//! The secret store exports one flat JSON object per environment:
//!
//! ```json
//! {
//!   "ACQUIRER01_APIKEY": "ak-1",
//!   "ACQUIRER01_SECRETKEY": "hello",
//!   "ACQUIRER01_ID": "500001",
//!   "XNAP_APIKEY": "xk",
//!   "XNAP_SECRETKEY": "xs"
//! }
//! ```
//!
//! Every `<PREFIX>_APIKEY` pairs with `<PREFIX>_SECRETKEY`. The partner id is
//! `<PREFIX>_ID` when present, otherwise the lower-cased prefix. Other keys
//! (idempotency keys, webhook settings) are ignored.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SourceError;
use crate::profile::{PartnerProfile, parse_profiles};

const API_KEY_SUFFIX: &str = "_APIKEY";
const SECRET_SUFFIX: &str = "_SECRETKEY";
const ID_SUFFIX: &str = "_ID";

/// Flat key/value document exported from the secret store.
pub type SecretDocument = BTreeMap<String, Value>;

/// Turn a secret document into partner profiles, ordered by prefix.
///
/// Pairs are returned even when the key or secret is empty; conversion into
/// credentials skips those.
#[must_use]
pub fn profiles_from_secrets(document: &SecretDocument) -> Vec<PartnerProfile> {
    let text = |key: String| {
        document
            .get(&key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };

    document
        .keys()
        .filter_map(|key| key.strip_suffix(API_KEY_SUFFIX))
        .map(|prefix| {
            let id = text(format!("{prefix}{ID_SUFFIX}"));
            PartnerProfile {
                name: if id.is_empty() {
                    prefix.to_ascii_lowercase()
                } else {
                    id
                },
                acq_id: prefix.to_owned(),
                api_key: text(format!("{prefix}{API_KEY_SUFFIX}")),
                secret: text(format!("{prefix}{SECRET_SUFFIX}")),
            }
        })
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CredentialDocument {
    Profiles(Vec<Value>),
    Secrets(SecretDocument),
}

/// Parse either a partner-profile array or a secret-store object.
///
/// The shape is detected from the top-level JSON value.
pub fn parse_credential_document(payload: &[u8]) -> Result<Vec<PartnerProfile>, SourceError> {
    match serde_json::from_slice(payload)? {
        CredentialDocument::Profiles(_) => parse_profiles(payload),
        CredentialDocument::Secrets(document) => Ok(profiles_from_secrets(&document)),
    }
}
