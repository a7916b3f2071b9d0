use thiserror::Error;

use crate::cert::CertError;

/// Errors escaping a revocation check.
///
/// A Revoked verdict is never an error; checks fail only when the active
/// policy demands a conclusive answer and no source produced one.
#[derive(Error, Debug)]
pub enum RevocationError {
    #[error("OCSP check failed: {0}")]
    Ocsp(String),

    #[error("CRL check failed: {0}")]
    Crl(String),

    #[error("revocation status could not be established: {0}")]
    Inconclusive(String),

    #[error("certificate error: {0}")]
    Certificate(#[from] CertError),

    #[error("initialization failed: {0}")]
    Init(String),
}
