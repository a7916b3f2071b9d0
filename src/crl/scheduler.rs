use std::sync::Arc;

use tokio::time::{Duration, interval};
use tracing::{debug, error, warn};

use super::errors::CrlResult;
use super::fetcher::{CrlFetch, fetch_all};
use super::updater::CrlUpdater;

/// Configuration for the background CRL refresh task.
#[derive(Debug, Clone)]
pub struct CrlSchedulerConfig {
    /// How often to refresh cached CRLs (in seconds)
    pub check_interval_secs: u64,
    /// Distribution point URLs to load eagerly at startup
    pub bootstrap_urls: Vec<String>,
}

impl Default for CrlSchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 3600, // 1 hour
            bootstrap_urls: Vec::new(),
        }
    }
}

/// Periodically refreshes cached CRLs and evicts expired ones.
pub struct CrlScheduler {
    config: CrlSchedulerConfig,
    updater: Arc<CrlUpdater>,
    fetcher: Arc<dyn CrlFetch>,
}

impl CrlScheduler {
    pub fn new(
        config: CrlSchedulerConfig,
        updater: Arc<CrlUpdater>,
        fetcher: Arc<dyn CrlFetch>,
    ) -> Self {
        Self {
            config,
            updater,
            fetcher,
        }
    }

    /// Load the configured bootstrap URLs and refresh everything cached.
    /// Returns the number of issuers refreshed or confirmed fresh.
    pub async fn trigger_immediate_update(&self) -> CrlResult<usize> {
        debug!("Performing immediate CRL refresh");

        if !self.config.bootstrap_urls.is_empty() {
            // Fetch all bootstrap distribution points in parallel
            let results =
                fetch_all(Arc::clone(&self.fetcher), &self.config.bootstrap_urls).await;
            for (url, result) in results {
                match result {
                    Ok(crl) => {
                        if let Err(e) = self.updater.install_unsolicited(crl).await {
                            warn!("Bootstrap CRL from {url} rejected: {e}");
                        }
                    }
                    Err(e) => {
                        warn!("Failed to load bootstrap CRL from {url}: {e}");
                    }
                }
            }
        }

        let refreshed = self.updater.refresh_all().await;
        let removed = self.updater.cleanup_expired().await;
        if removed > 0 {
            debug!("Evicted {removed} expired CRLs during scheduled refresh");
        }
        Ok(refreshed)
    }

    /// Start the scheduler (spawns background task)
    pub async fn start(self) -> CrlResult<()> {
        let check_interval = Duration::from_secs(self.config.check_interval_secs);
        debug!(
            "Starting CRL scheduler with interval of {} seconds",
            self.config.check_interval_secs
        );

        let scheduler = Arc::new(self);

        tokio::spawn(async move {
            let mut ticker = interval(check_interval);
            ticker.tick().await; // First tick completes immediately

            loop {
                ticker.tick().await;
                debug!("Running scheduled CRL refresh");

                match scheduler.trigger_immediate_update().await {
                    Ok(refreshed) => {
                        debug!("Scheduled CRL refresh updated {refreshed} issuers");
                    }
                    Err(e) => {
                        error!("Scheduled CRL refresh failed: {e}");
                    }
                }
            }
        });

        Ok(())
    }
}
