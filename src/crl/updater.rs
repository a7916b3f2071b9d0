use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cert::CertificateSource;

use super::cache::CrlCache;
use super::errors::{CrlError, CrlResult};
use super::fetcher::{CrlFetch, fetch_and_parse};
use super::types::ParsedCrl;

/// Drives refresh of cached CRLs: fetch, parse, monotonicity check, store.
pub struct CrlUpdater {
    cache: Arc<RwLock<CrlCache>>,
    fetcher: Arc<dyn CrlFetch>,
    refresh_threshold: Duration,
}

impl CrlUpdater {
    pub fn new(
        cache: Arc<RwLock<CrlCache>>,
        fetcher: Arc<dyn CrlFetch>,
        refresh_threshold: Duration,
    ) -> Self {
        Self {
            cache,
            fetcher,
            refresh_threshold,
        }
    }

    /// Refresh the CRL for a certificate's issuer from the certificate's
    /// own distribution points.
    ///
    /// Returns the freshest CRL available: the newly fetched one on
    /// success, the cached one when every distribution point fails, `None`
    /// when the certificate names no distribution points. With `silent`
    /// set, total failure is logged and surfaced as `None` instead of an
    /// error.
    pub async fn update_from_certificate(
        &self,
        subject: &CertificateSource,
        silent: bool,
    ) -> CrlResult<Option<Arc<ParsedCrl>>> {
        let issuer_dn_der = subject.issuer_dn_der()?;
        let distribution_points = subject.crl_distribution_points()?;

        if distribution_points.is_empty() {
            warn!("No CRL distribution points found in certificate");
            return Ok(None);
        }

        let mut last_error: Option<CrlError> = None;
        for url in &distribution_points {
            match self.update(&issuer_dn_der, url, false).await {
                Ok(true) => {
                    if let Some(crl) = self.cache.write().await.get(&issuer_dn_der) {
                        return Ok(Some(crl));
                    }
                }
                Ok(false) => {
                    last_error = Some(CrlError::Custom(format!(
                        "CRL update from {url} was rejected"
                    )));
                }
                Err(e) => {
                    warn!("CRL update from {url} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        // All distribution points failed; fall back to whatever is cached
        if let Some(cached) = self.cache.write().await.get(&issuer_dn_der) {
            warn!("All CRL distribution points failed, using cached CRL");
            return Ok(Some(cached));
        }

        let error =
            last_error.unwrap_or_else(|| CrlError::Custom("no distribution point succeeded".into()));
        if silent {
            warn!("CRL update failed for all distribution points: {error}");
            Ok(None)
        } else {
            Err(error)
        }
    }

    /// Fetch `url` and install the result for `issuer_dn_der`.
    ///
    /// Skips network I/O while the cached CRL is fresh, rejects CRLs whose
    /// issuer does not match, and enforces CRL Number monotonicity: a
    /// smaller number than the cached one is treated as a rollback. With
    /// `silent` set, failures are logged and returned as `false`.
    pub async fn update(&self, issuer_dn_der: &[u8], url: &str, silent: bool) -> CrlResult<bool> {
        match self.try_update(issuer_dn_der, url).await {
            Ok(installed) => Ok(installed),
            Err(e) if silent => {
                warn!("CRL update from {url} failed: {e}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn try_update(&self, issuer_dn_der: &[u8], url: &str) -> CrlResult<bool> {
        {
            let cache = self.cache.read().await;
            if !cache.expiring_soon(issuer_dn_der, self.refresh_threshold) {
                debug!("Cached CRL is fresh, skipping fetch from {url}");
                return Ok(true);
            }
        }

        let crl = fetch_and_parse(self.fetcher.as_ref(), url).await?;

        if crl.issuer_dn_der != issuer_dn_der {
            warn!(
                "CRL from {url} has unexpected issuer: {}",
                crl.issuer_dn
            );
            return Err(CrlError::IssuerMismatch {
                expected: hex::encode(issuer_dn_der),
                actual: crl.issuer_dn.clone(),
            });
        }

        self.install(crl).await
    }

    /// Monotonicity gate and cache installation.
    async fn install(&self, crl: ParsedCrl) -> CrlResult<bool> {
        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.peek(&crl.issuer_dn_der) {
            if crl.crl_number < cached.crl_number {
                warn!(
                    "Rejecting CRL for {}: number went backward ({} -> {})",
                    crl.issuer_dn, cached.crl_number, crl.crl_number
                );
                return Err(CrlError::NumberRollback {
                    cached: cached.crl_number.to_string(),
                    fetched: crl.crl_number.to_string(),
                });
            }
            if crl.crl_number == cached.crl_number && crl.this_update <= cached.this_update {
                debug!(
                    "CRL for {} is already up to date (number {})",
                    crl.issuer_dn, crl.crl_number
                );
                return Ok(true);
            }
        }

        info!(
            "Installing CRL for {} (number {}, {} entries)",
            crl.issuer_dn,
            crl.crl_number,
            crl.entries.len()
        );
        cache.put(crl);
        Ok(true)
    }

    /// Install an externally obtained CRL (static file, bootstrap URL),
    /// keyed by its own issuer, still subject to the monotonicity gate.
    pub async fn install_unsolicited(&self, crl: ParsedCrl) -> CrlResult<bool> {
        self.install(crl).await
    }

    /// Re-fetch every cached CRL from its original source URL. Returns the
    /// number of issuers whose CRL was refreshed or confirmed fresh.
    pub async fn refresh_all(&self) -> usize {
        let candidates = {
            let cache = self.cache.read().await;
            cache.refresh_candidates()
        };

        let mut refreshed = 0;
        for (issuer_dn_der, url) in candidates {
            if matches!(self.update(&issuer_dn_der, &url, true).await, Ok(true)) {
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Evict protocol-expired CRLs from the cache.
    pub async fn cleanup_expired(&self) -> usize {
        self.cache.write().await.remove_expired()
    }
}
