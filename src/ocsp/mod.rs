//! Online Certificate Status Protocol (OCSP) client support (RFC 6960)
//!
//! Request construction (CertID, nonce), responder queries over HTTP POST,
//! response matching and freshness validation, and per-CertID caching.

mod cache;
mod client;
mod errors;
mod request;
mod response;

// Re-export public types
pub use cache::OcspCache;
pub use client::{HttpOcspTransport, OcspClient, OcspTransport, OcspVerdict};
pub use errors::{OcspError, OcspResult};
pub use request::{CertId, OcspRequest, OcspRequestBuilder};
pub use response::{
    OcspCertStatus, OcspResponderId, OcspResponseStatus, ParsedOcspResponse, parse_response,
};
