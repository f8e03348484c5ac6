//! Partner credential sources for Liquidgate.
//!
//! Partners are described by profile records (`acqId`, `name`, `apiKey`,
//! `secret`) served either from a JSON file or from the partner-profile
//! service. A file may instead hold the flat document exported from the
//! secret store (`ACQUIRERnn_APIKEY`, `ACQUIRERnn_SECRETKEY`, `ACQUIRERnn_ID`). This crate turns those records into [`liquidgate_auth::Credential`]s
//! and keeps a [`liquidgate_auth::CredentialRegistry`] current:
//!
//! - [`FileCredentialSource`] reads either document shape from disk
//! - [`PartnerProfileSource`] fetches `GET {base}/v1/profile/acquirers`
//! - [`CredentialRefresher`] loads once at boot, then reloads on an interval
//!   until shutdown, keeping the previous set whenever a reload fails

pub mod error;
pub mod profile;
pub mod refresher;
pub mod secrets;
pub mod source;

pub use error::SourceError;
pub use profile::{PartnerProfile, credentials_from_profiles, parse_profiles};
pub use refresher::CredentialRefresher;
pub use secrets::{SecretDocument, parse_credential_document, profiles_from_secrets};
pub use source::{CredentialSource, FileCredentialSource, PartnerProfileSource};
