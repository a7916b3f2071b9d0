use thiserror::Error;
use x509_parser::asn1_rs::BitString;
use x509_parser::prelude::*;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("malformed verifier input: {0}")]
    Malformed(String),

    #[error("signature verification failed")]
    Invalid,
}

/// Verifies a detached signature over raw message bytes.
///
/// All inputs are DER fragments so callers never depend on a particular
/// parser's borrowed types; implementations decide which algorithms they
/// accept.
pub trait SignatureVerifier: Send + Sync {
    fn verify(
        &self,
        spki_der: &[u8],
        algorithm_der: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> Result<(), SignatureError>;
}

/// Default verifier backed by `x509_parser::verify`.
///
/// Supports the RSA and ECDSA algorithm identifiers that crate exposes.
#[derive(Debug, Default, Clone, Copy)]
pub struct X509SignatureVerifier;

impl SignatureVerifier for X509SignatureVerifier {
    fn verify(
        &self,
        spki_der: &[u8],
        algorithm_der: &[u8],
        signature: &[u8],
        message: &[u8],
    ) -> Result<(), SignatureError> {
        let (_, spki) = SubjectPublicKeyInfo::from_der(spki_der)
            .map_err(|e| SignatureError::Malformed(format!("subject public key info: {e}")))?;
        let (_, algorithm) = AlgorithmIdentifier::from_der(algorithm_der)
            .map_err(|e| SignatureError::Malformed(format!("algorithm identifier: {e}")))?;
        let signature = BitString::new(0, signature);

        x509_parser::verify::verify_signature(&spki, &algorithm, &signature, message)
            .map_err(|_| SignatureError::Invalid)
    }
}
