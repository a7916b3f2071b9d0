//! Certificate adapter: owned DER bytes plus the typed accessors the
//! revocation checkers need.
//!
//! Full X.509 semantics stay in `x509-parser`; this module only exposes
//! canonical name/key encodings, the serial number, and the AIA and
//! CRL-distribution-point URLs.

use std::io::Cursor;

use thiserror::Error;
use x509_parser::oid_registry;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

use crate::asn1::der::{self, DerError};
use crate::asn1::oid;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("certificate parsing failed: {0}")]
    Parse(String),

    #[error("invalid PEM envelope")]
    PemEnvelope,
}

impl From<DerError> for CertError {
    fn from(e: DerError) -> Self {
        CertError::Parse(e.to_string())
    }
}

/// An owned certificate, parsed on demand.
#[derive(Debug, Clone)]
pub struct CertificateSource {
    der: Vec<u8>,
}

impl CertificateSource {
    /// Wrap DER bytes, validating that they form a single certificate.
    pub fn from_der(der: Vec<u8>) -> Result<Self, CertError> {
        let (remaining, _) = X509Certificate::from_der(&der)
            .map_err(|e| CertError::Parse(format!("DER parsing failed: {e}")))?;
        if !remaining.is_empty() {
            return Err(CertError::Parse(
                "certificate contains trailing data after DER".to_string(),
            ));
        }
        Ok(Self { der })
    }

    /// Read a certificate from a PEM envelope with the `CERTIFICATE` label.
    pub fn from_pem(pem_bytes: &[u8]) -> Result<Self, CertError> {
        let mut cursor = Cursor::new(pem_bytes);
        let (pem, _) = Pem::read(&mut cursor).map_err(|_| CertError::PemEnvelope)?;
        if pem.label != "CERTIFICATE" {
            return Err(CertError::PemEnvelope);
        }
        Self::from_der(pem.contents)
    }

    /// Accept either PEM or DER input, sniffing for the PEM preamble.
    pub fn load(bytes: &[u8]) -> Result<Self, CertError> {
        if bytes.starts_with(b"-----BEGIN") {
            Self::from_pem(bytes)
        } else {
            Self::from_der(bytes.to_vec())
        }
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Parse the certificate. Cheap enough to do per accessor; the borrowed
    /// result cannot outlive `self`.
    pub fn parse(&self) -> Result<X509Certificate<'_>, CertError> {
        let (_, cert) = X509Certificate::from_der(&self.der)
            .map_err(|e| CertError::Parse(format!("DER parsing failed: {e}")))?;
        Ok(cert)
    }

    /// Displayable subject distinguished name.
    pub fn subject_dn(&self) -> Result<String, CertError> {
        Ok(self.parse()?.tbs_certificate.subject.to_string())
    }

    /// Displayable issuer distinguished name.
    pub fn issuer_dn(&self) -> Result<String, CertError> {
        Ok(self.parse()?.tbs_certificate.issuer.to_string())
    }

    /// Canonical DER encoding of the subject Name.
    pub fn subject_dn_der(&self) -> Result<Vec<u8>, CertError> {
        Ok(self.parse()?.tbs_certificate.subject.as_raw().to_vec())
    }

    /// Canonical DER encoding of the issuer Name.
    pub fn issuer_dn_der(&self) -> Result<Vec<u8>, CertError> {
        Ok(self.parse()?.tbs_certificate.issuer.as_raw().to_vec())
    }

    /// Serial number as canonical lowercase big-endian hex.
    pub fn serial_hex(&self) -> Result<String, CertError> {
        Ok(hex::encode(self.serial_bytes()?))
    }

    /// Serial number as big-endian bytes without leading zero octets.
    pub fn serial_bytes(&self) -> Result<Vec<u8>, CertError> {
        Ok(self.parse()?.tbs_certificate.serial.to_bytes_be())
    }

    /// Full DER encoding of the SubjectPublicKeyInfo.
    pub fn spki_der(&self) -> Result<Vec<u8>, CertError> {
        Ok(self.parse()?.tbs_certificate.subject_pki.raw.to_vec())
    }

    /// Raw subjectPublicKey BIT STRING contents, the RFC 6960 §4.1.1
    /// issuer key hash input (the key bits only, not the whole SPKI
    /// structure).
    pub fn spki_key_bits(&self) -> Result<Vec<u8>, CertError> {
        let spki = self.spki_der()?;
        Ok(der::spki_key_bits(&spki)?)
    }

    /// OCSP responder URLs from the AIA extension, in certificate order.
    pub fn ocsp_responders(&self) -> Result<Vec<String>, CertError> {
        let cert = self.parse()?;
        let mut urls = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
                for access in &aia.accessdescs {
                    if access.access_method.to_id_string() == oid::ID_AD_OCSP_STR
                        && let GeneralName::URI(uri) = &access.access_location
                        && !uri.is_empty()
                    {
                        urls.push(uri.to_string());
                    }
                }
            }
        }
        Ok(urls)
    }

    /// HTTP(S) CRL distribution point URLs, in certificate order. Other
    /// general-name forms (directoryName, x400Address, ...) are skipped.
    pub fn crl_distribution_points(&self) -> Result<Vec<String>, CertError> {
        let cert = self.parse()?;
        let mut urls = Vec::new();
        for ext in cert.extensions() {
            if let ParsedExtension::CRLDistributionPoints(points) = ext.parsed_extension() {
                for point in &points.points {
                    if let Some(DistributionPointName::FullName(names)) = &point.distribution_point
                    {
                        for name in names {
                            if let GeneralName::URI(uri) = name
                                && (uri.starts_with("http://") || uri.starts_with("https://"))
                            {
                                urls.push(uri.to_string());
                            }
                        }
                    }
                }
            }
        }
        Ok(urls)
    }

    /// Whether the certificate carries the id-kp-OCSPSigning extended key
    /// usage (delegated OCSP responder certificates).
    pub fn has_ocsp_signing_eku(&self) -> Result<bool, CertError> {
        let cert = self.parse()?;
        for ext in cert.extensions() {
            if ext.oid == oid_registry::OID_X509_EXT_EXTENDED_KEY_USAGE
                && let ParsedExtension::ExtendedKeyUsage(eku) = ext.parsed_extension()
            {
                return Ok(eku.ocsp_signing
                    || eku
                        .other
                        .iter()
                        .any(|o| o.to_id_string() == oid::ID_KP_OCSP_SIGNING_STR));
            }
        }
        Ok(false)
    }
}
