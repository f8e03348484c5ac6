//! Error types for the Liquidgate core.

/// Startup and infrastructure errors.
///
/// Per-request authentication failures are not represented here; they live in
/// `liquidgate_auth::AuthError`. Everything in this enum is fatal for the
/// process that hits it.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration value missing or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// The credential registry could not be populated at boot.
    #[error("credential registry unavailable: {0}")]
    RegistryUnavailable(String),
}

/// Convenience result type for Liquidgate startup operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
