//! Gateway HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use tracing::Instrument;

use liquidgate_auth::{AuthRequest, PublicErrorCode, RequestAuthenticator};

use crate::body::GatewayBody;
use crate::dispatch::{AuthenticatedRequest, UpstreamHandler, dispatch_request};
use crate::error::UpstreamError;
use crate::headers::{self, PARTNER_ID_HEADER, REQUEST_ID_HEADER};
use crate::response::{CONTENT_TYPE, error_response, health_response};

/// Paths answered without authentication.
const HEALTH_PATHS: [&str; 2] = ["/health", "/_health"];

/// Default cap on a buffered request body (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Configuration for the gateway HTTP service.
#[derive(Debug, Clone)]
pub struct AuthHttpConfig {
    /// Service name attached to every request span.
    pub service_name: String,
    /// Largest request body buffered for signature verification.
    pub max_body_bytes: usize,
}

impl Default for AuthHttpConfig {
    fn default() -> Self {
        Self {
            service_name: "liquidgate".to_owned(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Hyper `Service` that authenticates every request before handing it to an
/// [`UpstreamHandler`].
#[derive(Debug)]
pub struct AuthHttpService<H: UpstreamHandler> {
    handler: Arc<H>,
    authenticator: RequestAuthenticator,
    config: Arc<AuthHttpConfig>,
    remote_addr: Option<SocketAddr>,
}

impl<H: UpstreamHandler> AuthHttpService<H> {
    /// Create a new `AuthHttpService`.
    pub fn new(
        handler: Arc<H>,
        authenticator: RequestAuthenticator,
        config: AuthHttpConfig,
    ) -> Self {
        Self {
            handler,
            authenticator,
            config: Arc::new(config),
            remote_addr: None,
        }
    }

    /// A copy of this service bound to one client connection.
    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: SocketAddr) -> Self {
        self.remote_addr = Some(remote_addr);
        self
    }

    /// Run one request through the gateway pipeline.
    ///
    /// Generic over the request body so callers other than hyper's connection
    /// loop can drive the service.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<GatewayBody>
    where
        B: http_body::Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        handle_request(req, self).await
    }
}

impl<H: UpstreamHandler> Clone for AuthHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            authenticator: self.authenticator.clone(),
            config: Arc::clone(&self.config),
            remote_addr: self.remote_addr,
        }
    }
}

impl<H: UpstreamHandler> hyper::service::Service<http::Request<Incoming>> for AuthHttpService<H> {
    type Response = http::Response<GatewayBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

/// Wrap the pipeline in a request span, log its completion and stamp common
/// headers.
async fn handle_request<B, H>(
    req: http::Request<B>,
    service: &AuthHttpService<H>,
) -> http::Response<GatewayBody>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
    H: UpstreamHandler,
{
    let started = Instant::now();
    let request_id = headers::request_id(req.headers());
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        uri = %req.uri(),
        user_agent = tracing::field::Empty,
        remote_addr = tracing::field::Empty,
        partner_id = tracing::field::Empty,
        service = %service.config.service_name,
    );
    if let Some(user_agent) = headers::header_str(req.headers(), "user-agent") {
        span.record("user_agent", user_agent);
    }
    if let Some(remote_addr) = service.remote_addr {
        span.record("remote_addr", tracing::field::display(remote_addr.ip()));
    }

    let response = process_request(
        req,
        service.handler.as_ref(),
        &service.authenticator,
        service.config.max_body_bytes,
        &request_id,
    )
    .instrument(span.clone())
    .await;

    let status = response.status();
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    span.in_scope(|| {
        tracing::info!(
            status = status.as_u16(),
            elapsed_ms,
            error_type = error_type(status),
            "request completed",
        );
    });

    add_common_headers(response, &request_id)
}

/// Log classification of a response: rejections are business errors,
/// gateway faults are system errors.
fn error_type(status: http::StatusCode) -> &'static str {
    if status.is_server_error() {
        "SystemError"
    } else if status.is_client_error() {
        "BusinessError"
    } else {
        "None"
    }
}

/// Process a single request: health check, authentication, then dispatch.
async fn process_request<B, H>(
    req: http::Request<B>,
    handler: &H,
    authenticator: &RequestAuthenticator,
    max_body_bytes: usize,
    request_id: &str,
) -> http::Response<GatewayBody>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
    H: UpstreamHandler,
{
    let (parts, incoming) = req.into_parts();

    // 1. Health checks bypass authentication.
    if parts.method == http::Method::GET && HEALTH_PATHS.contains(&parts.uri.path()) {
        return health_response(request_id);
    }

    // 2. Collect body, capped. The signature covers the raw bytes.
    let body = match collect_body(incoming, max_body_bytes).await {
        Ok(body) => body,
        Err(err @ UpstreamError::BodyTooLarge(_)) => {
            let status = http::StatusCode::PAYLOAD_TOO_LARGE;
            tracing::info!(error = %err, status = status.as_u16(), "request rejected");
            return error_response(PublicErrorCode::InternalError, status, request_id);
        }
        Err(err) => return internal_error(&err, request_id),
    };

    let claimed_partner = headers::header_str(&parts.headers, PARTNER_ID_HEADER)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned);

    // 3. Authenticate.
    let outcome = {
        let auth_request = AuthRequest::new(
            &parts.method,
            headers::api_key(&parts.headers),
            headers::signature(&parts.headers),
            &body,
        );
        authenticator.authenticate(&auth_request)
    };

    let decision = match outcome {
        Ok(decision) => decision,
        Err(rejection) => {
            if let Some(partner_id) = claimed_partner.as_ref().or(rejection.partner_id.as_ref()) {
                tracing::Span::current().record("partner_id", partner_id.as_str());
            }
            let status = http::StatusCode::UNAUTHORIZED;
            tracing::info!(
                reason = rejection.reason.reason(),
                detail = %rejection.reason,
                error_code = rejection.public_code().code(),
                status = status.as_u16(),
                "request rejected",
            );
            return error_response(rejection.public_code(), status, request_id);
        }
    };

    let partner_id = claimed_partner.as_deref().unwrap_or(&decision.partner_id);
    tracing::Span::current().record("partner_id", partner_id);
    tracing::info!(signed = decision.is_signed(), "request accepted");

    // 4. Dispatch to the upstream handler.
    let request = AuthenticatedRequest {
        parts,
        body,
        decision,
        request_id: request_id.to_owned(),
    };
    match dispatch_request(handler, request).await {
        Ok(response) => response,
        Err(err) => internal_error(&err, request_id),
    }
}

fn internal_error(err: &UpstreamError, request_id: &str) -> http::Response<GatewayBody> {
    let status = http::StatusCode::INTERNAL_SERVER_ERROR;
    tracing::error!(error = %err, status = status.as_u16(), "request failed");
    error_response(PublicErrorCode::InternalError, status, request_id)
}

/// Collect the incoming body into a single `Bytes` buffer of at most `limit`
/// bytes.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, UpstreamError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                UpstreamError::BodyTooLarge(limit)
            } else {
                UpstreamError::Body(e.to_string())
            }
        })
}

/// Add common response headers to every gateway response.
fn add_common_headers(
    mut response: http::Response<GatewayBody>,
    request_id: &str,
) -> http::Response<GatewayBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert("server", http::HeaderValue::from_static("Liquidgate"));

    response
}
