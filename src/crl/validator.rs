use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::cert::CertificateSource;
use crate::crypto::SignatureVerifier;

use super::errors::{CrlError, CrlResult};
use super::types::{ParsedCrl, RevocationReason};

/// Verdict of looking a certificate up in a CRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrlVerdict {
    Good,
    Revoked {
        reason: Option<RevocationReason>,
        revoked_at: OffsetDateTime,
    },
}

/// Validates a CRL's authenticity and classifies certificates against it.
pub struct CrlValidator {
    verifier: Arc<dyn SignatureVerifier>,
}

impl CrlValidator {
    pub fn new(verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self { verifier }
    }

    /// Check issuer binding, temporal validity and the issuer signature.
    ///
    /// An expired CRL (`nextUpdate` in the past) is recorded as a warning
    /// rather than a failure; whether to act on it is the caller's policy
    /// (RFC 5280 §6.3.3 treats this as advisory). A CRL that is not yet in
    /// force is fatal.
    pub fn validate(
        &self,
        crl: &ParsedCrl,
        issuer: &CertificateSource,
    ) -> CrlResult<Vec<String>> {
        let mut warnings = Vec::new();

        let issuer_subject = issuer.subject_dn_der()?;
        if issuer_subject != crl.issuer_dn_der {
            return Err(CrlError::IssuerMismatch {
                expected: issuer.subject_dn()?,
                actual: crl.issuer_dn.clone(),
            });
        }

        let now = OffsetDateTime::now_utc();
        if now < crl.this_update {
            return Err(CrlError::NotYetValid(crl.this_update.to_string()));
        }
        if let Some(next_update) = crl.next_update
            && now > next_update
        {
            let message = format!("CRL is expired (nextUpdate {next_update})");
            warn!("{message}");
            warnings.push(message);
        }

        if crl.has_signature_material() {
            self.verifier
                .verify(
                    &issuer.spki_der()?,
                    crl.signature_algorithm_der(),
                    crl.signature_bits(),
                    crl.tbs_bytes(),
                )
                .map_err(|e| {
                    debug!("CRL signature verification failed: {e}");
                    CrlError::SignatureVerification
                })?;
            debug!("CRL signature verified for {}", crl.issuer_dn);
        } else {
            let message = "CRL lacks signature material, skipping verification".to_string();
            warn!("{message}");
            warnings.push(message);
        }

        Ok(warnings)
    }

    /// Classify `subject` against `crl`.
    ///
    /// An entry whose reason code is 8 (removeFromCRL) signals that a
    /// previous certificateHold was lifted, so it yields `Good`.
    pub fn check_revocation(
        &self,
        subject: &CertificateSource,
        issuer: &CertificateSource,
        crl: &ParsedCrl,
    ) -> CrlResult<(CrlVerdict, Vec<String>)> {
        let subject_issuer = subject.issuer_dn_der()?;
        if subject_issuer != crl.issuer_dn_der {
            return Err(CrlError::IssuerMismatch {
                expected: subject.issuer_dn()?,
                actual: crl.issuer_dn.clone(),
            });
        }

        let warnings = self.validate(crl, issuer)?;

        let serial_hex = subject.serial_hex()?;
        match crl.find_entry(&serial_hex) {
            None => Ok((CrlVerdict::Good, warnings)),
            Some(entry) if entry.reason == Some(RevocationReason::RemoveFromCrl) => {
                debug!(
                    "Serial {serial_hex} carries removeFromCRL, treating as not revoked"
                );
                Ok((CrlVerdict::Good, warnings))
            }
            Some(entry) => {
                debug!(
                    "Serial {serial_hex} is revoked (reason {:?})",
                    entry.reason
                );
                Ok((
                    CrlVerdict::Revoked {
                        reason: entry.reason,
                        revoked_at: entry.revocation_date,
                    },
                    warnings,
                ))
            }
        }
    }
}
