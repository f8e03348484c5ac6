//! Request header extraction.

use http::HeaderMap;

/// Primary API key header.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Legacy API key header, consulted when [`API_KEY_HEADER`] is absent.
pub const LIQUID_API_KEY_HEADER: &str = "liquid-api-key";
/// Header carrying the `t=<ts>,<digest>` envelope.
pub const SIGNATURE_HEADER: &str = "signature";
/// Client-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Client-supplied partner id, preferred over the credential's for logging.
pub const PARTNER_ID_HEADER: &str = "x-partner-id";

/// Value of header `name` if present and valid visible ASCII.
#[must_use]
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The API key sent by the client.
///
/// A present `X-Api-Key` wins even when empty; `Liquid-Api-Key` is only read
/// when `X-Api-Key` is absent.
#[must_use]
pub fn api_key(headers: &HeaderMap) -> Option<&str> {
    if headers.contains_key(API_KEY_HEADER) {
        header_str(headers, API_KEY_HEADER)
    } else {
        header_str(headers, LIQUID_API_KEY_HEADER)
    }
}

/// The `Signature` envelope sent by the client.
#[must_use]
pub fn signature(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, SIGNATURE_HEADER)
}

/// The client's request id, or a freshly generated one.
#[must_use]
pub fn request_id(headers: &HeaderMap) -> String {
    header_str(headers, REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), ToOwned::to_owned)
}
