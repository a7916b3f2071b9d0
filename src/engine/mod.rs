//! Revocation decision engine
//!
//! Drives the OCSP client and the CRL pipeline according to a
//! `RevocationPolicy` and combines their per-source outcomes into a single
//! verdict: `true` when the certificate is currently believed valid,
//! `false` when it is revoked or its status cannot be established under
//! the policy. Each check leaves a `CheckReport` snapshot behind.

mod errors;
mod outcome;
mod policy;
mod report;

pub use errors::RevocationError;
pub use outcome::{RevocationMethod, SourceOutcome};
pub use policy::RevocationPolicy;
pub use report::CheckReport;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cert::CertificateSource;
use crate::config::RevocationSettings;
use crate::crl::{
    CrlCache, CrlError, CrlFetch, CrlUpdater, CrlValidator, CrlVerdict, HttpCrlFetcher,
};
use crate::crypto::{SignatureVerifier, X509SignatureVerifier};
use crate::ocsp::{OcspCertStatus, OcspClient, OcspError, OcspTransport};

/// Policy-driven coordinator over the two revocation sources.
///
/// All shared state (CRL cache, OCSP cache, settings) lives behind this
/// instance; concurrent checks from distinct tasks are safe.
pub struct RevocationEngine {
    policy: RevocationPolicy,
    crl_cache: Arc<RwLock<CrlCache>>,
    crl_updater: Arc<CrlUpdater>,
    crl_validator: CrlValidator,
    ocsp_client: OcspClient,
    last_report: RwLock<CheckReport>,
}

impl RevocationEngine {
    /// Engine with HTTP transports and the default signature verifier.
    pub fn new(settings: RevocationSettings) -> Result<Self, RevocationError> {
        let fetcher = HttpCrlFetcher::new(settings.crl.fetch_timeout())
            .map_err(|e| RevocationError::Init(e.to_string()))?;
        let verifier: Arc<dyn SignatureVerifier> = Arc::new(X509SignatureVerifier);
        let ocsp_client = OcspClient::new(&settings.ocsp, Arc::clone(&verifier))
            .map_err(|e| RevocationError::Init(e.to_string()))?;
        Ok(Self::assemble(
            settings,
            Arc::new(fetcher),
            verifier,
            ocsp_client,
        ))
    }

    /// Engine with injected transports and verifier (tests, stapling, air
    /// gaps).
    pub fn with_parts(
        settings: RevocationSettings,
        fetcher: Arc<dyn CrlFetch>,
        transport: Arc<dyn OcspTransport>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        let ocsp_client =
            OcspClient::with_transport(&settings.ocsp, Arc::clone(&verifier), transport);
        Self::assemble(settings, fetcher, verifier, ocsp_client)
    }

    fn assemble(
        settings: RevocationSettings,
        fetcher: Arc<dyn CrlFetch>,
        verifier: Arc<dyn SignatureVerifier>,
        ocsp_client: OcspClient,
    ) -> Self {
        let crl_cache = Arc::new(RwLock::new(CrlCache::new(
            settings.crl.cache_max_entries,
            settings.crl.cache_soft_ttl(),
        )));
        let crl_updater = Arc::new(CrlUpdater::new(
            Arc::clone(&crl_cache),
            fetcher,
            settings.crl.refresh_threshold(),
        ));
        Self {
            policy: settings.policy,
            crl_cache,
            crl_updater,
            crl_validator: CrlValidator::new(verifier),
            ocsp_client,
            last_report: RwLock::new(CheckReport::default()),
        }
    }

    pub fn policy(&self) -> RevocationPolicy {
        self.policy
    }

    pub fn crl_cache(&self) -> &Arc<RwLock<CrlCache>> {
        &self.crl_cache
    }

    /// The updater, shareable with a `CrlScheduler` for background refresh.
    pub fn crl_updater(&self) -> Arc<CrlUpdater> {
        Arc::clone(&self.crl_updater)
    }

    /// Snapshot of the report left by the most recent check.
    pub async fn last_report(&self) -> CheckReport {
        self.last_report.read().await.clone()
    }

    /// Decide whether `subject`, issued by `issuer`, is currently believed
    /// valid.
    pub async fn check(
        &self,
        subject: &CertificateSource,
        issuer: &CertificateSource,
    ) -> Result<bool, RevocationError> {
        let mut report = CheckReport::new(self.policy.as_str());
        let decision = self.run_policy(subject, issuer, &mut report).await;
        if let Ok(allowed) = &decision {
            report.result = Some(*allowed);
        }
        *self.last_report.write().await = report;
        decision
    }

    async fn run_policy(
        &self,
        subject: &CertificateSource,
        issuer: &CertificateSource,
        report: &mut CheckReport,
    ) -> Result<bool, RevocationError> {
        match self.policy {
            RevocationPolicy::Disabled => {
                debug!("Revocation checking is disabled, accepting certificate");
                Ok(true)
            }
            RevocationPolicy::OcspOnly => {
                let outcome = self.ocsp_outcome(subject, issuer).await;
                report.record(RevocationMethod::Ocsp, &outcome);
                conclude_single(outcome, RevocationMethod::Ocsp)
            }
            RevocationPolicy::CrlOnly => {
                let outcome = self.crl_outcome(subject, issuer).await;
                report.record(RevocationMethod::Crl, &outcome);
                conclude_single(outcome, RevocationMethod::Crl)
            }
            RevocationPolicy::OcspPreferred => {
                let primary = self.ocsp_outcome(subject, issuer).await;
                report.record(RevocationMethod::Ocsp, &primary);
                if primary.is_conclusive() {
                    return Ok(!primary.is_revoked());
                }
                let fallback = self.crl_outcome(subject, issuer).await;
                report.record(RevocationMethod::Crl, &fallback);
                conclude_preferred(primary, fallback)
            }
            RevocationPolicy::CrlPreferred => {
                let primary = self.crl_outcome(subject, issuer).await;
                report.record(RevocationMethod::Crl, &primary);
                if primary.is_conclusive() {
                    return Ok(!primary.is_revoked());
                }
                let fallback = self.ocsp_outcome(subject, issuer).await;
                report.record(RevocationMethod::Ocsp, &fallback);
                conclude_preferred(primary, fallback)
            }
            RevocationPolicy::SoftFail => {
                // Both sources run even after a Good: a Revoked verdict from
                // the second source overrides
                let ocsp = self.ocsp_outcome(subject, issuer).await;
                report.record(RevocationMethod::Ocsp, &ocsp);
                let crl = self.crl_outcome(subject, issuer).await;
                report.record(RevocationMethod::Crl, &crl);
                Ok(verdict_soft(&ocsp, &crl))
            }
            RevocationPolicy::HardFail => {
                let ocsp = self.ocsp_outcome(subject, issuer).await;
                report.record(RevocationMethod::Ocsp, &ocsp);
                let crl = self.crl_outcome(subject, issuer).await;
                report.record(RevocationMethod::Crl, &crl);
                Ok(verdict_hard(&ocsp, &crl))
            }
        }
    }

    async fn ocsp_outcome(
        &self,
        subject: &CertificateSource,
        issuer: &CertificateSource,
    ) -> SourceOutcome {
        match self.ocsp_client.check(subject, issuer, None).await {
            Ok(verdict) => match verdict.status {
                OcspCertStatus::Good => SourceOutcome::Good,
                OcspCertStatus::Revoked { revoked_at, reason } => {
                    SourceOutcome::Revoked { reason, revoked_at }
                }
                OcspCertStatus::Unknown => SourceOutcome::Unknown,
            },
            Err(e) => {
                warn!("OCSP check failed: {e}");
                classify_ocsp_error(&e)
            }
        }
    }

    async fn crl_outcome(
        &self,
        subject: &CertificateSource,
        issuer: &CertificateSource,
    ) -> SourceOutcome {
        let crl = match self.crl_updater.update_from_certificate(subject, false).await {
            Ok(Some(crl)) => crl,
            Ok(None) => {
                return SourceOutcome::PolicyFailure(
                    "no CRL distribution points in certificate".to_string(),
                );
            }
            Err(e) => {
                warn!("CRL update failed: {e}");
                return classify_crl_error(&e);
            }
        };

        match self.crl_validator.check_revocation(subject, issuer, &crl) {
            Ok((CrlVerdict::Good, warnings)) => {
                for warning in warnings {
                    debug!("CRL warning: {warning}");
                }
                SourceOutcome::Good
            }
            Ok((CrlVerdict::Revoked { reason, revoked_at }, _)) => {
                SourceOutcome::Revoked { reason, revoked_at }
            }
            Err(e) => {
                warn!("CRL revocation check failed: {e}");
                classify_crl_error(&e)
            }
        }
    }
}

/// Single-source policies: inconclusive outcomes propagate as errors.
fn conclude_single(
    outcome: SourceOutcome,
    method: RevocationMethod,
) -> Result<bool, RevocationError> {
    match outcome {
        SourceOutcome::Good => Ok(true),
        SourceOutcome::Revoked { .. } => Ok(false),
        other => {
            let message = describe(&other);
            Err(match method {
                RevocationMethod::Ocsp => RevocationError::Ocsp(message),
                RevocationMethod::Crl => RevocationError::Crl(message),
            })
        }
    }
}

/// Preferred policies, reached when the primary source was inconclusive:
/// the fallback decides, or the whole check errors.
fn conclude_preferred(
    primary: SourceOutcome,
    fallback: SourceOutcome,
) -> Result<bool, RevocationError> {
    match fallback {
        SourceOutcome::Good => Ok(true),
        SourceOutcome::Revoked { .. } => Ok(false),
        other => Err(RevocationError::Inconclusive(format!(
            "{}; {}",
            describe(&primary),
            describe(&other)
        ))),
    }
}

/// SoftFail: only an actual Revoked verdict rejects.
fn verdict_soft(ocsp: &SourceOutcome, crl: &SourceOutcome) -> bool {
    !(ocsp.is_revoked() || crl.is_revoked())
}

/// HardFail: both sources must answer Good; anything else rejects.
fn verdict_hard(ocsp: &SourceOutcome, crl: &SourceOutcome) -> bool {
    if ocsp.is_revoked() || crl.is_revoked() {
        return false;
    }
    matches!(ocsp, SourceOutcome::Good) && matches!(crl, SourceOutcome::Good)
}

fn describe(outcome: &SourceOutcome) -> String {
    match outcome {
        SourceOutcome::Unknown => "responder does not know the certificate".to_string(),
        other => other
            .error_message()
            .unwrap_or("no error recorded")
            .to_string(),
    }
}

fn classify_ocsp_error(error: &OcspError) -> SourceOutcome {
    let message = error.to_string();
    match error {
        OcspError::Http(_) | OcspError::Timeout => SourceOutcome::TransportFailure(message),
        OcspError::NoResponderUrl | OcspError::Stale(_) | OcspError::InvalidUrl(_) => {
            SourceOutcome::PolicyFailure(message)
        }
        _ => SourceOutcome::ProtocolFailure(message),
    }
}

fn classify_crl_error(error: &CrlError) -> SourceOutcome {
    let message = error.to_string();
    match error {
        CrlError::Http(_) | CrlError::Timeout | CrlError::NotFound(_) | CrlError::Custom(_) => {
            SourceOutcome::TransportFailure(message)
        }
        CrlError::NoDistributionPoint | CrlError::InvalidUrl(_) => {
            SourceOutcome::PolicyFailure(message)
        }
        _ => SourceOutcome::ProtocolFailure(message),
    }
}
