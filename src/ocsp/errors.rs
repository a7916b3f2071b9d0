use thiserror::Error;

use crate::asn1::ocsp::OcspResponseStatus;
use crate::cert::CertError;

/// OCSP-related errors
#[derive(Error, Debug)]
pub enum OcspError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid OCSP responder URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("timeout while querying OCSP responder")]
    Timeout,

    #[error("OCSP request encoding failed: {0}")]
    Encode(String),

    #[error("OCSP response decoding failed: {0}")]
    Decode(String),

    #[error("OCSP responder answered with status {0:?}")]
    ResponderStatus(OcspResponseStatus),

    #[error("no single response matches the requested CertID")]
    CertIdMismatch,

    #[error("OCSP nonce mismatch")]
    NonceMismatch,

    #[error("stale OCSP response: {0}")]
    Stale(String),

    #[error("no OCSP responder URL available")]
    NoResponderUrl,

    #[error("OCSP response signature verification failed")]
    SignatureVerification,

    #[error("certificate error: {0}")]
    Certificate(#[from] CertError),

    #[error("{0}")]
    Custom(String),
}

/// Convenient Result type alias
pub type OcspResult<T> = Result<T, OcspError>;
