//! Integration tests for the Liquidgate gateway.
//!
//! Every test starts the gateway in-process on an ephemeral port and talks to
//! it over real HTTP with `reqwest`, so no external server is needed.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use liquidgate_auth::{Credential, CredentialRegistry, RequestAuthenticator};
use liquidgate_http::{AuthHttpConfig, AuthHttpService, UpstreamHandler};

static INIT: Once = Once::new();

/// Replay window used by test credentials.
pub const TEST_SKEW: Duration = Duration::from_secs(600);

/// API key of the default test partner.
pub const API_KEY: &str = "ak-500001";

/// Shared secret of the default test partner.
pub const SECRET: &str = "hello";

/// Partner id of the default test partner.
pub const PARTNER_ID: &str = "500001";

/// A representative payment body.
pub const PAYMENT_BODY: &str = r#"{"partner_id":"500001","payee":"payeeliquid","crn":"12345"}"#;

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// The default test partner credential.
#[must_use]
pub fn partner_credential() -> Credential {
    Credential::new(API_KEY, SECRET, PARTNER_ID, TEST_SKEW)
}

/// HTTP client for talking to test servers.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("reqwest client")
}

/// A gateway running on a background task. Stops when dropped.
#[derive(Debug)]
pub struct TestGateway {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// Registry the gateway authenticates against.
    pub registry: Arc<CredentialRegistry>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestGateway {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Start a gateway serving `handler`, authenticating against `credentials`.
pub async fn spawn_gateway<H: UpstreamHandler>(
    handler: H,
    credentials: Vec<Credential>,
) -> TestGateway {
    let registry = Arc::new(CredentialRegistry::from_credentials(credentials));
    spawn_gateway_with_registry(handler, registry).await
}

/// Start a gateway over an existing registry.
pub async fn spawn_gateway_with_registry<H: UpstreamHandler>(
    handler: H,
    registry: Arc<CredentialRegistry>,
) -> TestGateway {
    init_tracing();

    let authenticator = RequestAuthenticator::new(registry.clone());
    let service = AuthHttpService::new(
        Arc::new(handler),
        authenticator,
        AuthHttpConfig {
            service_name: "liquidgate-test".to_owned(),
            ..AuthHttpConfig::default()
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = oneshot::channel();
    tokio::spawn(serve_gateway(listener, service, rx));

    TestGateway {
        base_url: format!("http://{addr}"),
        registry,
        shutdown: Some(tx),
    }
}

async fn serve_gateway<H: UpstreamHandler>(
    listener: TcpListener,
    service: AuthHttpService<H>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let http = HttpConnBuilder::new(TokioExecutor::new());
    loop {
        tokio::select! {
            result = listener.accept() => {
                let Ok((stream, peer_addr)) = result else { continue };
                let svc = service.clone().with_remote_addr(peer_addr);
                let conn = http
                    .serve_connection(TokioIo::new(stream), svc)
                    .into_owned();
                tokio::spawn(async move {
                    let _ = conn.await;
                });
            }
            _ = &mut shutdown => break,
        }
    }
}

/// Scripted stand-in for the partner-profile service.
#[derive(Debug)]
pub struct ProfileStub {
    /// Base URL to hand to `PartnerProfileSource`.
    pub base_url: String,
    state: Arc<Mutex<StubReply>>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[derive(Debug, Clone)]
struct StubReply {
    status: u16,
    body: String,
}

impl ProfileStub {
    /// Start a stub answering `GET /v1/profile/acquirers` with `profiles`.
    pub async fn start(profiles: serde_json::Value) -> Self {
        let state = Arc::new(Mutex::new(StubReply {
            status: 200,
            body: profiles.to_string(),
        }));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr: SocketAddr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel();
        tokio::spawn(serve_stub(listener, Arc::clone(&state), rx));

        Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(tx),
        }
    }

    /// Serve a new profile list from now on.
    pub fn set_profiles(&self, profiles: serde_json::Value) {
        let mut reply = self.state.lock().expect("stub state");
        reply.status = 200;
        reply.body = profiles.to_string();
    }

    /// Answer every request with `status` and an empty body.
    pub fn fail_with(&self, status: u16) {
        let mut reply = self.state.lock().expect("stub state");
        reply.status = status;
        reply.body = String::new();
    }
}

impl Drop for ProfileStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_stub(
    listener: TcpListener,
    state: Arc<Mutex<StubReply>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                let Ok((stream, _)) = result else { continue };
                let state = Arc::clone(&state);
                let svc = hyper::service::service_fn(move |req: http::Request<Incoming>| {
                    let reply = stub_reply(&state, req.uri().path());
                    async move { Ok::<_, Infallible>(reply) }
                });
                tokio::spawn(async move {
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
            _ = &mut shutdown => break,
        }
    }
}

fn stub_reply(state: &Mutex<StubReply>, path: &str) -> http::Response<Full<Bytes>> {
    let reply = state.lock().expect("stub state").clone();
    let (status, body) = if path == "/v1/profile/acquirers" {
        (reply.status, reply.body)
    } else {
        (404, String::new())
    };
    http::Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("stub response")
}

mod test_auth;
mod test_refresh;
mod test_replay;
