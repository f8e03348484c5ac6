//! Gateway response serialization and error formatting.

use liquidgate_auth::PublicErrorCode;
use serde::Serialize;

use crate::body::GatewayBody;
use crate::headers::REQUEST_ID_HEADER;

/// Content type for every JSON response the gateway produces.
pub const CONTENT_TYPE: &str = "application/json";

/// Public error body.
///
/// ```json
/// {"error_code": "00400002", "error_description": "Invalid signature"}
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Eight-digit public error code.
    pub error_code: &'static str,
    /// Description paired with the code.
    pub error_description: &'static str,
}

impl From<PublicErrorCode> for ErrorBody {
    fn from(code: PublicErrorCode) -> Self {
        Self {
            error_code: code.code(),
            error_description: code.description(),
        }
    }
}

/// Serialize a public error code into its JSON body.
#[must_use]
pub fn error_to_json(code: PublicErrorCode) -> Vec<u8> {
    serde_json::to_vec(&ErrorBody::from(code)).expect("JSON serialization of error cannot fail")
}

/// Build a complete error response for `code`.
#[must_use]
pub fn error_response(
    code: PublicErrorCode,
    status: http::StatusCode,
    request_id: &str,
) -> http::Response<GatewayBody> {
    json_response(status, error_to_json(code), request_id)
}

/// Build a JSON response with the given status.
#[must_use]
pub fn json_response(
    status: http::StatusCode,
    json: Vec<u8>,
    request_id: &str,
) -> http::Response<GatewayBody> {
    let mut response = http::Response::builder()
        .status(status)
        .header("content-type", CONTENT_TYPE)
        .body(GatewayBody::from_json(json))
        .expect("valid JSON response");

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, hv);
    }

    response
}

/// Health check response: `{"status":"running","version":"..."}`.
#[must_use]
pub fn health_response(request_id: &str) -> http::Response<GatewayBody> {
    let json = serde_json::to_vec(&serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .expect("JSON serialization of health status cannot fail");
    json_response(http::StatusCode::OK, json, request_id)
}
