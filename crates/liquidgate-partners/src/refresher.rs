//! Periodic credential reload.

use std::sync::Arc;
use std::time::Duration;

use liquidgate_auth::CredentialRegistry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{info, warn};

use crate::error::SourceError;
use crate::source::CredentialSource;

/// Keeps a [`CredentialRegistry`] in sync with a [`CredentialSource`].
///
/// The boot load must succeed; after that a failed reload keeps the previous
/// set in place.
pub struct CredentialRefresher {
    source: Arc<dyn CredentialSource>,
    registry: Arc<CredentialRegistry>,
    interval: Duration,
}

impl std::fmt::Debug for CredentialRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRefresher")
            .field("source", &self.source.describe())
            .field("registry", &self.registry)
            .field("interval", &self.interval)
            .finish()
    }
}

impl CredentialRefresher {
    /// Create a refresher. `interval` must be non-zero.
    #[must_use]
    pub fn new(
        source: Arc<dyn CredentialSource>,
        registry: Arc<CredentialRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            registry,
            interval,
        }
    }

    /// Load the initial credential set. Callers treat an error as fatal.
    pub async fn load_initial(&self) -> Result<usize, SourceError> {
        let credentials = self.source.load().await?;
        if credentials.is_empty() {
            warn!(source = %self.source.describe(), "starting with no partner credentials");
        }
        let count = self.registry.replace(credentials);
        info!(source = %self.source.describe(), credentials = count, "partner credentials loaded");
        Ok(count)
    }

    /// Reload once, publishing the new set only if the load succeeded.
    ///
    /// An empty result never replaces a non-empty registry.
    pub async fn refresh_once(&self) -> Result<usize, SourceError> {
        let credentials = self.source.load().await?;
        if credentials.is_empty() && !self.registry.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(self.registry.replace(credentials))
    }

    /// Reload on every tick until `shutdown` flips to `true` or its sender
    /// is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            source = %self.source.describe(),
            interval_secs = self.interval.as_secs(),
            "credential refresher started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("credential refresher shutting down");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.refresh_once().await {
                        warn!(
                            error = %err,
                            credentials = self.registry.len(),
                            "credential refresh failed, keeping previous set"
                        );
                    }
                }
            }
        }
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
