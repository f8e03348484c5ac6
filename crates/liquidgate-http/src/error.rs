//! Errors raised after authentication succeeded.

/// Failure while reading the request or serving it upstream.
///
/// These are server-side faults and are answered with the internal-error code,
/// never with one of the authentication codes.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The request body could not be read.
    #[error("failed to read request body: {0}")]
    Body(String),

    /// The request body exceeded the configured cap.
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    /// The upstream handler failed.
    #[error("upstream request failed: {0}")]
    Upstream(String),
}
