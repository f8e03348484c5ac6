//! Configuration and startup error types for Liquidgate.
//!
//! This crate holds the pieces shared by every Liquidgate binary: the
//! environment-driven [`GatewayConfig`] and the [`GatewayError`] type used for
//! fatal startup conditions.

mod config;
mod error;

pub use config::{GatewayConfig, LogFormat};
pub use error::{GatewayError, GatewayResult};
