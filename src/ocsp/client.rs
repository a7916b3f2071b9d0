use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::asn1::der as asn1_der;
use crate::cert::CertificateSource;
use crate::config::OcspSettings;
use crate::crypto::SignatureVerifier;

use super::cache::OcspCache;
use super::errors::{OcspError, OcspResult};
use super::request::{CertId, OcspRequestBuilder};
use super::response::{OcspCertStatus, ParsedOcspResponse, parse_response};

pub const USER_AGENT: &str = concat!("revocheck/", env!("CARGO_PKG_VERSION"));

/// Transport seam for responder queries so tests can script exchanges.
#[async_trait]
pub trait OcspTransport: Send + Sync {
    /// POST a DER request and return the raw response body.
    async fn post(&self, url: &str, request_der: &[u8]) -> OcspResult<Vec<u8>>;
}

/// HTTP POST transport per RFC 6960 appendix A.
pub struct HttpOcspTransport {
    client: Client,
    response_timeout: Duration,
}

impl HttpOcspTransport {
    pub fn new(connect_timeout: Duration, response_timeout: Duration) -> OcspResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(response_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            response_timeout,
        })
    }
}

#[async_trait]
impl OcspTransport for HttpOcspTransport {
    async fn post(&self, url: &str, request_der: &[u8]) -> OcspResult<Vec<u8>> {
        debug!("Sending OCSP request to {url}");

        let send = self
            .client
            .post(url)
            .header("Content-Type", "application/ocsp-request")
            .header("Accept", "application/ocsp-response")
            .header("Content-Length", request_der.len())
            .header("Connection", "close")
            .body(request_der.to_vec())
            .send();

        let response = match timeout(self.response_timeout, send).await {
            Ok(result) => result?,
            Err(_) => return Err(OcspError::Timeout),
        };

        if !response.status().is_success() {
            return Err(OcspError::Custom(format!(
                "HTTP error {} from OCSP responder {url}",
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Verdict of a completed OCSP exchange.
#[derive(Debug, Clone)]
pub struct OcspVerdict {
    pub status: OcspCertStatus,
    pub from_cache: bool,
    pub response: Arc<ParsedOcspResponse>,
}

/// OCSP client: builds requests, queries responders, matches and validates
/// responses, and caches verdicts per CertID.
pub struct OcspClient {
    transport: Arc<dyn OcspTransport>,
    verifier: Arc<dyn SignatureVerifier>,
    builder: OcspRequestBuilder,
    cache: OcspCache,
    clock_skew_tolerance: Duration,
}

impl OcspClient {
    /// Client with the default HTTP transport.
    pub fn new(
        settings: &OcspSettings,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> OcspResult<Self> {
        let transport = Arc::new(HttpOcspTransport::new(
            settings.connect_timeout(),
            settings.response_timeout(),
        )?);
        Ok(Self::with_transport(settings, verifier, transport))
    }

    /// Client with an injected transport (tests, stapled bytes, ...).
    pub fn with_transport(
        settings: &OcspSettings,
        verifier: Arc<dyn SignatureVerifier>,
        transport: Arc<dyn OcspTransport>,
    ) -> Self {
        Self {
            transport,
            verifier,
            builder: OcspRequestBuilder::new(settings.certid_hash, settings.use_nonce),
            cache: OcspCache::new(settings.cache_enabled),
            clock_skew_tolerance: settings.clock_skew_tolerance(),
        }
    }

    /// Query the revocation status of `subject`.
    ///
    /// The responder URL is `explicit_url` when given, otherwise the first
    /// AIA id-ad-ocsp entry of the subject certificate.
    pub async fn check(
        &self,
        subject: &CertificateSource,
        issuer: &CertificateSource,
        explicit_url: Option<&str>,
    ) -> OcspResult<OcspVerdict> {
        let cert_id = CertId::new(subject, issuer, self.builder.hash_algorithm())?;

        if let Some(cached) = self.cache.get(&cert_id).await {
            return Ok(OcspVerdict {
                status: cached.cert_status.clone(),
                from_cache: true,
                response: cached,
            });
        }

        let url = match explicit_url {
            Some(url) => url.to_string(),
            None => {
                let responders = subject.ocsp_responders()?;
                match responders.into_iter().next() {
                    Some(url) => url,
                    None => {
                        warn!("Certificate has no OCSP responder in its AIA extension");
                        return Err(OcspError::NoResponderUrl);
                    }
                }
            }
        };

        let request = self.builder.build(cert_id)?;
        let body = self.transport.post(&url, request.as_der()).await?;
        let parsed = parse_response(&body, &request.cert_id)?;

        // Nonce equality is required when both sides carry one; a one-sided
        // nonce is tolerated with a warning (many responders pre-produce
        // responses and cannot echo nonces)
        match (&request.nonce_hex, &parsed.nonce_hex) {
            (Some(sent), Some(echoed)) if sent != echoed => {
                warn!("OCSP responder echoed a different nonce");
                return Err(OcspError::NonceMismatch);
            }
            (Some(_), None) => {
                warn!("OCSP responder did not echo the request nonce");
            }
            (None, Some(_)) => {
                warn!("OCSP responder sent an unsolicited nonce");
            }
            _ => {}
        }

        let now = OffsetDateTime::now_utc();
        if parsed.this_update > now + self.clock_skew_tolerance {
            return Err(OcspError::Stale(format!(
                "thisUpdate {} is beyond the clock skew tolerance",
                parsed.this_update
            )));
        }
        if let Some(next_update) = parsed.next_update
            && now > next_update
        {
            return Err(OcspError::Stale(format!(
                "response expired at {next_update}"
            )));
        }

        self.verify_response_signature(&parsed, issuer)?;

        let response = Arc::new(parsed);
        self.cache.put(Arc::clone(&response)).await;

        Ok(OcspVerdict {
            status: response.cert_status.clone(),
            from_cache: false,
            response,
        })
    }

    /// Verify the response signature against the issuer key, falling back
    /// to a delegated responder certificate that the issuer signed and that
    /// carries id-kp-OCSPSigning. Deeper chain validation belongs to the
    /// path-validation layer.
    fn verify_response_signature(
        &self,
        response: &ParsedOcspResponse,
        issuer: &CertificateSource,
    ) -> OcspResult<()> {
        let issuer_spki = issuer.spki_der()?;
        if self
            .verifier
            .verify(
                &issuer_spki,
                &response.signature_algorithm_der,
                &response.signature_bits,
                &response.tbs_bytes,
            )
            .is_ok()
        {
            debug!("OCSP response signed directly by the issuer");
            return Ok(());
        }

        for cert_der in &response.responder_certs_der {
            let Ok(responder) = CertificateSource::from_der(cert_der.clone()) else {
                continue;
            };
            if responder.issuer_dn_der()? != issuer.subject_dn_der()? {
                continue;
            }
            if !responder.has_ocsp_signing_eku()? {
                warn!("Included responder certificate lacks id-kp-OCSPSigning");
                continue;
            }
            // The responder certificate itself must be signed by the issuer
            let Ok(split) = asn1_der::split_signed_sequence(cert_der) else {
                continue;
            };
            if self
                .verifier
                .verify(
                    &issuer_spki,
                    split.signature_algorithm.slice(cert_der),
                    &split.signature,
                    split.tbs.slice(cert_der),
                )
                .is_err()
            {
                warn!("Included responder certificate is not signed by the issuer");
                continue;
            }
            if self
                .verifier
                .verify(
                    &responder.spki_der()?,
                    &response.signature_algorithm_der,
                    &response.signature_bits,
                    &response.tbs_bytes,
                )
                .is_ok()
            {
                debug!("OCSP response signed by a delegated responder");
                return Ok(());
            }
        }

        Err(OcspError::SignatureVerification)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.len().await
    }
}
