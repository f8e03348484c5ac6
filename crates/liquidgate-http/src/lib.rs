//! HTTP authentication layer for Liquidgate.
//!
//! This crate puts the [`liquidgate_auth::RequestAuthenticator`] in front of an
//! upstream handler:
//!
//! - **Headers**: API key (`X-Api-Key`, falling back to `Liquid-Api-Key`),
//!   `Signature`, request id, and partner id extraction
//! - **Handler trait**: the boundary between authentication and whatever
//!   serves authenticated requests
//! - **Service**: hyper `Service` running health checks, authentication,
//!   decision logging, and dispatch
//! - **Response helpers**: the `{error_code, error_description}` error body

pub mod body;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod response;
pub mod service;

pub use body::GatewayBody;
pub use dispatch::{AcknowledgeHandler, AuthenticatedRequest, UpstreamHandler};
pub use error::UpstreamError;
pub use service::{AuthHttpConfig, AuthHttpService, DEFAULT_MAX_BODY_BYTES};
