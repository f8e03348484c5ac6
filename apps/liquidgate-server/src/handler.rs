//! Upstream handlers wired into the gateway service.

use std::time::Duration;

use liquidgate_http::dispatch::UpstreamFuture;
use liquidgate_http::headers::{PARTNER_ID_HEADER, REQUEST_ID_HEADER};
use liquidgate_http::{
    AcknowledgeHandler, AuthenticatedRequest, GatewayBody, UpstreamError, UpstreamHandler,
};

/// Request headers that are not forwarded upstream.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Forwards authenticated requests to an internal service.
#[derive(Debug, Clone)]
pub struct ForwardingHandler {
    client: reqwest::Client,
    base_url: String,
}

impl ForwardingHandler {
    /// Create a handler forwarding to `base_url`, abandoning any request that
    /// takes longer than `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Upstream URL for an inbound request URI.
    fn target(&self, uri: &http::Uri) -> String {
        let path = uri.path_and_query().map_or("/", http::uri::PathAndQuery::as_str);
        format!("{}{path}", self.base_url)
    }
}

/// Headers sent upstream: the inbound set minus hop-by-hop headers, plus the
/// authenticated partner id and the request id.
fn forwarded_headers(request: &AuthenticatedRequest) -> http::HeaderMap {
    let mut headers = request.parts.headers.clone();
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(http::header::CONTENT_LENGTH);

    if let Ok(hv) = http::HeaderValue::from_str(&request.decision.partner_id) {
        headers.insert(PARTNER_ID_HEADER, hv);
    }
    if let Ok(hv) = http::HeaderValue::from_str(&request.request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers
}

impl UpstreamHandler for ForwardingHandler {
    fn handle(&self, request: AuthenticatedRequest) -> UpstreamFuture {
        let client = self.client.clone();
        let url = self.target(&request.parts.uri);
        let headers = forwarded_headers(&request);

        Box::pin(async move {
            let upstream = client
                .request(request.parts.method.clone(), &url)
                .headers(headers)
                .body(request.body)
                .send()
                .await
                .map_err(|e| UpstreamError::Upstream(e.to_string()))?;

            let status = upstream.status();
            let content_type = upstream.headers().get(http::header::CONTENT_TYPE).cloned();
            let body = upstream
                .bytes()
                .await
                .map_err(|e| UpstreamError::Upstream(e.to_string()))?;

            let mut builder = http::Response::builder().status(status);
            if let Some(content_type) = content_type {
                builder = builder.header(http::header::CONTENT_TYPE, content_type);
            }
            builder
                .body(GatewayBody::from_bytes(body))
                .map_err(|e| UpstreamError::Upstream(e.to_string()))
        })
    }
}

/// The handler selected at startup.
#[derive(Debug, Clone)]
pub enum GatewayHandler {
    /// Proxy to `UPSTREAM_URL`.
    Forward(ForwardingHandler),
    /// Answer locally with the authenticated partner id.
    Acknowledge(AcknowledgeHandler),
}

impl GatewayHandler {
    /// Forward when an upstream is configured, acknowledge otherwise.
    pub fn from_upstream(
        upstream_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(match upstream_url {
            Some(url) => Self::Forward(ForwardingHandler::new(url, timeout)?),
            None => Self::Acknowledge(AcknowledgeHandler),
        })
    }
}

impl UpstreamHandler for GatewayHandler {
    fn handle(&self, request: AuthenticatedRequest) -> UpstreamFuture {
        match self {
            Self::Forward(handler) => handler.handle(request),
            Self::Acknowledge(handler) => handler.handle(request),
        }
    }
}
