//! Object identifiers used by the revocation subsystem.

// Hash algorithms for OCSP CertID construction
pub const ID_SHA1_STR: &str = "1.3.14.3.2.26";
pub const ID_SHA256_STR: &str = "2.16.840.1.101.3.4.2.1";
pub const ID_SHA1: &[u32] = &[1, 3, 14, 3, 2, 26];
pub const ID_SHA256: &[u32] = &[2, 16, 840, 1, 101, 3, 4, 2, 1];

// OCSP (RFC 6960)
pub const ID_AD_OCSP_STR: &str = "1.3.6.1.5.5.7.48.1";
pub const ID_AD_OCSP: &[u32] = &[1, 3, 6, 1, 5, 5, 7, 48, 1];
pub const ID_PKIX_OCSP_BASIC: &[u32] = &[1, 3, 6, 1, 5, 5, 7, 48, 1, 1];
pub const ID_PKIX_OCSP_NONCE: &[u32] = &[1, 3, 6, 1, 5, 5, 7, 48, 1, 2];

// Extended key usage for delegated OCSP responders
pub const ID_KP_OCSP_SIGNING_STR: &str = "1.3.6.1.5.5.7.3.9";

// CRL entry extensions (RFC 5280 §5.3)
pub const CRL_NUMBER_STR: &str = "2.5.29.20";
pub const REASON_CODE_STR: &str = "2.5.29.21";
pub const INVALIDITY_DATE_STR: &str = "2.5.29.24";
