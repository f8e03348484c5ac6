//! Liquidgate Server - partner request authentication gateway.
//!
//! Authenticates partner requests by API key and `t=<ts>,<digest>` signature
//! before forwarding them to an internal service. Partner credentials come from
//! a JSON file or the partner-profile service and are reloaded in the
//! background.
//!
//! # Usage
//!
//! ```text
//! CREDENTIALS_FILE=partners.json UPSTREAM_URL=http://payments:9000 liquidgate-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `SERVICE_NAME` | `liquidgate` | Service name in request spans |
//! | `MESSAGE_EXPIRATION_MSEC` | `600000` | Signature replay window |
//! | `MAX_BODY_BYTES` | `1048576` | Largest request body accepted |
//! | `CREDENTIALS_FILE` | *(unset)* | Partner-profile array or secret-store document |
//! | `PARTNER_PROFILE_URL` | *(unset)* | Partner-profile service base URL |
//! | `REFRESH_ACQUIRERS_SECS` | `15` | Credential reload interval |
//! | `UPSTREAM_URL` | *(unset)* | Forward target; acknowledge locally when unset |
//! | `UPSTREAM_TIMEOUT_SECS` | `30` | Time allowed for one forwarded request |

mod handler;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use liquidgate_auth::{CredentialRegistry, RequestAuthenticator};
use liquidgate_core::{GatewayConfig, GatewayError, LogFormat};
use liquidgate_http::{AuthHttpConfig, AuthHttpService, UpstreamHandler};
use liquidgate_partners::{
    CredentialRefresher, CredentialSource, FileCredentialSource, PartnerProfileSource,
};

use crate::handler::GatewayHandler;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
    }

    Ok(())
}

/// Build the credential source. A credentials file takes precedence over the
/// partner-profile service.
fn build_source(config: &GatewayConfig) -> Result<Arc<dyn CredentialSource>> {
    let max_skew = config.max_skew();
    if let Some(path) = &config.credentials_file {
        return Ok(Arc::new(FileCredentialSource::new(path, max_skew)));
    }
    if let Some(url) = &config.partner_profile_url {
        let source = PartnerProfileSource::new(url, max_skew)
            .context("failed to build partner profile client")?;
        return Ok(Arc::new(source));
    }
    anyhow::bail!("no credential source configured")
}

/// Build the [`AuthHttpConfig`] from the application [`GatewayConfig`].
fn build_http_config(config: &GatewayConfig) -> AuthHttpConfig {
    AuthHttpConfig {
        service_name: config.service_name.clone(),
        max_body_bytes: config.max_body_bytes,
    }
}

/// Resolve on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("received shutdown signal, draining connections");
}

/// Run the accept loop until `shutdown` resolves, then drain open connections.
async fn serve<H, F>(listener: TcpListener, service: AuthHttpService<H>, shutdown: F) -> Result<()>
where
    H: UpstreamHandler,
    F: Future<Output = ()>,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone().with_remote_addr(peer_addr);
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!(
        "GET /health HTTP/1.1\r\nHost: {addr}\r\nUser-Agent: liquidgate-health-check\r\nConnection: close\r\n\r\n"
    );
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    let healthy = response
        .lines()
        .next()
        .is_some_and(|status_line| status_line.split_whitespace().nth(1) == Some("200"));
    if healthy && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = GatewayConfig::from_env();
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = GatewayConfig::from_env();

    init_tracing(&config.log_level, config.log_format)?;
    config.validate()?;

    info!(
        gateway_listen = %config.gateway_listen,
        service_name = %config.service_name,
        message_expiration_ms = config.message_expiration_ms,
        refresh_interval_secs = config.refresh_interval_secs,
        upstream = config.upstream_url.as_deref().unwrap_or("(acknowledge)"),
        max_body_bytes = config.max_body_bytes,
        version = VERSION,
        "starting Liquidgate Server",
    );

    let registry = Arc::new(CredentialRegistry::new());
    let refresher = CredentialRefresher::new(
        build_source(&config)?,
        Arc::clone(&registry),
        config.refresh_interval(),
    );
    refresher
        .load_initial()
        .await
        .map_err(|e| GatewayError::RegistryUnavailable(e.to_string()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_task = refresher.spawn(shutdown_rx);

    let handler =
        GatewayHandler::from_upstream(config.upstream_url.as_deref(), config.upstream_timeout())
            .context("failed to build upstream client")?;
    let authenticator = RequestAuthenticator::new(registry);
    let service = AuthHttpService::new(
        Arc::new(handler),
        authenticator,
        build_http_config(&config),
    );

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    let served = serve(listener, service, shutdown_signal()).await;

    shutdown_tx.send(true).ok();
    if let Err(e) = refresh_task.await {
        warn!(error = %e, "credential refresher task failed");
    }

    served
}
