//! Liquidgate Sign - signer and test client for partner integrations.
//!
//! # Usage
//!
//! ```text
//! liquidgate-sign sign <secret> <body> [timestamp]
//! liquidgate-sign verify <secret> <body> <signature> [max_skew_ms]
//! liquidgate-sign get <url> <api_key>
//! liquidgate-sign post <url> <api_key> <secret> <body>
//! ```
//!
//! A body argument starting with `@` is read from the named file.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use liquidgate_auth::canonical::SignedMessage;
use liquidgate_auth::clock::unix_now;
use liquidgate_auth::{SignatureEnvelope, sign_message, verify_envelope};

#[derive(Parser, Debug)]
#[command(name = "liquidgate-sign", version)]
#[command(about = "Sign, verify and send Liquidgate partner requests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the Signature header value for a body.
    Sign {
        secret: String,
        body: String,
        /// Unix seconds; defaults to now.
        timestamp: Option<i64>,
    },
    /// Check a Signature header value against a body.
    Verify {
        secret: String,
        body: String,
        signature: String,
        /// Replay window in milliseconds.
        #[arg(default_value_t = 600_000)]
        max_skew_ms: u64,
    },
    /// Send a GET with only the API key.
    Get { url: String, api_key: String },
    /// Send a signed POST.
    Post {
        url: String,
        api_key: String,
        secret: String,
        body: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve a body argument, reading `@path` from disk.
fn read_body(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read body from {path}")),
        None => Ok(arg.to_owned()),
    }
}

fn sign(secret: &str, body: &str, timestamp: Option<i64>) -> SignatureEnvelope {
    let timestamp = timestamp.unwrap_or_else(unix_now);
    let message = SignedMessage::at(body.as_bytes(), timestamp);
    debug!(
        timestamp,
        canonical_len = message.canonical_form().len(),
        "signing canonical form"
    );
    sign_message(body.as_bytes(), secret.as_bytes(), Some(timestamp))
}

async fn send(request: reqwest::RequestBuilder) -> Result<()> {
    let response = request.send().await.context("request failed")?;
    let status = response.status();
    let body = response.text().await.context("failed to read response body")?;
    println!("{status}");
    println!("{body}");
    if !status.is_success() {
        anyhow::bail!("gateway answered {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Sign {
            secret,
            body,
            timestamp,
        } => {
            let body = read_body(&body)?;
            println!("{}", sign(&secret, &body, timestamp));
        }
        Command::Verify {
            secret,
            body,
            signature,
            max_skew_ms,
        } => {
            let body = read_body(&body)?;
            let envelope = verify_envelope(
                &signature,
                body.as_bytes(),
                secret.as_bytes(),
                Duration::from_millis(max_skew_ms),
            )
            .context("signature rejected")?;
            println!("valid: signed at {}", envelope.timestamp);
        }
        Command::Get { url, api_key } => {
            let client = reqwest::Client::new();
            send(client.get(&url).header("X-Api-Key", api_key)).await?;
        }
        Command::Post {
            url,
            api_key,
            secret,
            body,
        } => {
            let body = read_body(&body)?;
            let signature = sign(&secret, &body, None).to_string();
            let client = reqwest::Client::new();
            send(
                client
                    .post(&url)
                    .header("X-Api-Key", api_key)
                    .header("Signature", signature)
                    .header("Content-Type", "application/json")
                    .body(body),
            )
            .await?;
        }
    }

    Ok(())
}
