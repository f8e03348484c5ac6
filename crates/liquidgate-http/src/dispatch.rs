//! Upstream handler trait and dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use liquidgate_auth::AuthDecision;

use crate::body::GatewayBody;
use crate::error::UpstreamError;
use crate::response::json_response;

/// A request that passed authentication.
#[derive(Debug)]
pub struct AuthenticatedRequest {
    /// Request line and headers as received.
    pub parts: http::request::Parts,
    /// The raw body the signature was verified over.
    pub body: Bytes,
    /// Who the request was authenticated as.
    pub decision: AuthDecision,
    /// Request id echoed in every response.
    pub request_id: String,
}

/// Future returned by [`UpstreamHandler::handle`].
pub type UpstreamFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<GatewayBody>, UpstreamError>> + Send>>;

/// Serves requests once the gateway has authenticated them.
///
/// This trait is the boundary between the authentication layer and whatever
/// sits behind the gateway (a proxy to an internal service, or a local
/// acknowledgement).
pub trait UpstreamHandler: Send + Sync + 'static {
    /// Handle an authenticated request and produce an HTTP response.
    fn handle(&self, request: AuthenticatedRequest) -> UpstreamFuture;
}

/// Dispatch an authenticated request to the handler.
pub async fn dispatch_request<H: UpstreamHandler>(
    handler: &H,
    request: AuthenticatedRequest,
) -> Result<http::Response<GatewayBody>, UpstreamError> {
    tracing::debug!(
        partner_id = %request.decision.partner_id,
        signed = request.decision.is_signed(),
        "dispatching authenticated request",
    );
    handler.handle(request).await
}

/// Handler that answers every authenticated request with who it was
/// authenticated as.
#[derive(Debug, Clone, Default)]
pub struct AcknowledgeHandler;

impl UpstreamHandler for AcknowledgeHandler {
    fn handle(&self, request: AuthenticatedRequest) -> UpstreamFuture {
        Box::pin(async move {
            let json = serde_json::to_vec(&serde_json::json!({
                "status": "authenticated",
                "partner_id": request.decision.partner_id,
            }))
            .map_err(|e| UpstreamError::Upstream(e.to_string()))?;
            Ok(json_response(
                http::StatusCode::OK,
                json,
                &request.request_id,
            ))
        })
    }
}
