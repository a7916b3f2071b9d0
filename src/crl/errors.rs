use thiserror::Error;

use crate::cert::CertError;

/// CRL-related errors
#[derive(Error, Debug)]
pub enum CrlError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid CRL URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("CRL parsing failed: {0}")]
    Parse(String),

    #[error("invalid PEM envelope")]
    PemEnvelope,

    #[error("CRL not found at {0}")]
    NotFound(String),

    #[error("timeout while fetching CRL")]
    Timeout,

    #[error("CRL issuer mismatch: expected {expected}, got {actual}")]
    IssuerMismatch { expected: String, actual: String },

    #[error("CRL number rollback: cached {cached}, fetched {fetched}")]
    NumberRollback { cached: String, fetched: String },

    #[error("CRL is not yet in force (thisUpdate {0})")]
    NotYetValid(String),

    #[error("CRL signature verification failed")]
    SignatureVerification,

    #[error("CRL distribution point not found in certificate")]
    NoDistributionPoint,

    #[error("certificate error: {0}")]
    Certificate(#[from] CertError),

    #[error("{0}")]
    Custom(String),
}

/// Convenient Result type alias
pub type CrlResult<T> = Result<T, CrlError>;
