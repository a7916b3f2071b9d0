use std::collections::HashMap;
use std::fmt;

use time::OffsetDateTime;

use crate::asn1::der::ByteRange;

/// Revocation reasons as per RFC 5280
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl RevocationReason {
    /// Parse revocation reason from integer value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unspecified),
            1 => Some(Self::KeyCompromise),
            2 => Some(Self::CaCompromise),
            3 => Some(Self::AffiliationChanged),
            4 => Some(Self::Superseded),
            5 => Some(Self::CessationOfOperation),
            6 => Some(Self::CertificateHold),
            8 => Some(Self::RemoveFromCrl),
            9 => Some(Self::PrivilegeWithdrawn),
            10 => Some(Self::AaCompromise),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// A revoked certificate entry within a CRL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlRevokedEntry {
    /// Serial number as canonical lowercase big-endian hex.
    pub serial_hex: String,
    pub revocation_date: OffsetDateTime,
    /// Reason Code extension value; `None` covers both an absent extension
    /// and the unassigned value 7.
    pub reason: Option<RevocationReason>,
    /// Invalidity Date extension value, if present.
    pub invalidity_date: Option<OffsetDateTime>,
}

/// CRL Number extension value: a non-negative integer of arbitrary width,
/// compared numerically. Stored as normalized big-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrlNumber(Vec<u8>);

impl CrlNumber {
    pub fn zero() -> Self {
        Self(Vec::new())
    }

    /// Normalize big-endian bytes by stripping leading zero octets.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
        Self(bytes[start..].to_vec())
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_be_bytes(&value.to_be_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Ord for CrlNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for CrlNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CrlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "0");
        }
        if self.0.len() <= 16 {
            let mut value: u128 = 0;
            for &b in &self.0 {
                value = (value << 8) | b as u128;
            }
            write!(f, "{value}")
        } else {
            write!(f, "0x{}", hex::encode(&self.0))
        }
    }
}

/// A parsed CRL.
///
/// The raw DER buffer is retained for the lifetime of the value together
/// with byte ranges locating the `tbsCertList` and signature algorithm, so
/// signature verification always runs over the exact bytes the issuer
/// signed.
#[derive(Debug, Clone)]
pub struct ParsedCrl {
    pub(crate) raw: Vec<u8>,
    pub(crate) tbs: ByteRange,
    pub(crate) signature_algorithm: ByteRange,
    pub(crate) signature: Vec<u8>,
    /// Displayable issuer distinguished name.
    pub issuer_dn: String,
    /// Canonical DER of the issuer Name.
    pub issuer_dn_der: Vec<u8>,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    pub crl_number: CrlNumber,
    /// Revoked entries keyed by canonical serial hex.
    pub entries: HashMap<String, CrlRevokedEntry>,
    /// When this CRL was fetched or loaded.
    pub fetched_at: OffsetDateTime,
    /// Distribution point URL this CRL was fetched from, if any.
    pub source_url: Option<String>,
}

impl ParsedCrl {
    pub fn raw_der(&self) -> &[u8] {
        &self.raw
    }

    /// Exact bytes covered by the issuer's signature.
    pub fn tbs_bytes(&self) -> &[u8] {
        self.tbs.slice(&self.raw)
    }

    /// DER of the outer signature AlgorithmIdentifier.
    pub fn signature_algorithm_der(&self) -> &[u8] {
        self.signature_algorithm.slice(&self.raw)
    }

    /// Signature BIT STRING contents.
    pub fn signature_bits(&self) -> &[u8] {
        &self.signature
    }

    pub fn find_entry(&self, serial_hex: &str) -> Option<&CrlRevokedEntry> {
        self.entries.get(serial_hex)
    }

    /// Whether the pieces needed for signature verification are present.
    pub fn has_signature_material(&self) -> bool {
        self.tbs.len > 0 && self.signature_algorithm.len > 0 && !self.signature.is_empty()
    }

    /// Re-wrap the raw DER in a PEM envelope with the `X509 CRL` label.
    pub fn to_pem(&self) -> String {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.raw);
        let mut out = String::from("-----BEGIN X509 CRL-----\n");
        for chunk in encoded.as_bytes().chunks(64) {
            out.push_str(std::str::from_utf8(chunk).expect("base64 is ASCII"));
            out.push('\n');
        }
        out.push_str("-----END X509 CRL-----\n");
        out
    }
}
