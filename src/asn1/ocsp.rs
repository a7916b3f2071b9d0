//! OCSP wire structures (RFC 6960 §4.1, §4.2), DER-encoded with rasn.
//!
//! Only the unsigned request form is produced; responses are decoded in
//! full. The `BasicOCSPResponse` TBS bytes needed for signature checks are
//! recovered separately by TLV slicing (see `asn1::der`) so verification
//! never depends on a re-encoding.

use rasn::error::{DecodeError, EncodeError};
use rasn::prelude::{ObjectIdentifier as Oid, *};
use rasn_pkix::{AlgorithmIdentifier, Extension, Extensions};

use crate::asn1::oid;

/// CertID ::= SEQUENCE {
///     hashAlgorithm   AlgorithmIdentifier,
///     issuerNameHash  OCTET STRING,
///     issuerKeyHash   OCTET STRING,
///     serialNumber    CertificateSerialNumber
/// }
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
pub struct CertId {
    pub hash_algorithm: AlgorithmIdentifier,
    pub issuer_name_hash: OctetString,
    pub issuer_key_hash: OctetString,
    pub serial_number: Integer,
}

impl CertId {
    /// Field-wise match ignoring the algorithm parameters: responders may
    /// echo the hash algorithm with absent instead of NULL parameters.
    pub fn matches(&self, other: &CertId) -> bool {
        self.hash_algorithm.algorithm == other.hash_algorithm.algorithm
            && self.issuer_name_hash == other.issuer_name_hash
            && self.issuer_key_hash == other.issuer_key_hash
            && self.serial_number == other.serial_number
    }
}

/// Request ::= SEQUENCE {
///     reqCert                  CertID,
///     singleRequestExtensions  [0] EXPLICIT Extensions OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct Request {
    pub req_cert: CertId,
    #[rasn(tag(explicit(0)))]
    pub single_request_extensions: Option<Extensions>,
}

/// TBSRequest ::= SEQUENCE {
///     version            [0] EXPLICIT Version DEFAULT v1,
///     requestorName      [1] EXPLICIT GeneralName OPTIONAL,
///     requestList        SEQUENCE OF Request,
///     requestExtensions  [2] EXPLICIT Extensions OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct TbsRequest {
    #[rasn(tag(explicit(0)))]
    pub version: Option<Integer>,
    #[rasn(tag(explicit(1)))]
    pub requestor_name: Option<Any>,
    pub request_list: SequenceOf<Request>,
    #[rasn(tag(explicit(2)))]
    pub request_extensions: Option<Extensions>,
}

/// OCSPRequest ::= SEQUENCE {
///     tbsRequest         TBSRequest,
///     optionalSignature  [0] EXPLICIT Signature OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct OcspRequest {
    pub tbs_request: TbsRequest,
    #[rasn(tag(explicit(0)))]
    pub optional_signature: Option<Any>,
}

/// OCSPResponseStatus ::= ENUMERATED (RFC 6960 §4.2.1; 4 is reserved and
/// therefore rejected at the codec layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsnType, Encode, Decode)]
#[rasn(enumerated)]
pub enum OcspResponseStatus {
    Successful = 0,
    MalformedRequest = 1,
    InternalError = 2,
    TryLater = 3,
    SigRequired = 5,
    Unauthorized = 6,
}

/// ResponseBytes ::= SEQUENCE {
///     responseType  OBJECT IDENTIFIER,
///     response      OCTET STRING
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct ResponseBytes {
    pub response_type: Oid,
    pub response: OctetString,
}

/// OCSPResponse ::= SEQUENCE {
///     responseStatus  OCSPResponseStatus,
///     responseBytes   [0] EXPLICIT ResponseBytes OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct OcspResponse {
    pub status: OcspResponseStatus,
    #[rasn(tag(explicit(0)))]
    pub response_bytes: Option<ResponseBytes>,
}

/// ResponderID ::= CHOICE {
///     byName  [1] Name,
///     byKey   [2] KeyHash
/// }
#[derive(Debug, Clone, PartialEq, Eq, AsnType, Encode, Decode)]
#[rasn(choice)]
pub enum ResponderId {
    #[rasn(tag(explicit(1)))]
    ByName(Any),
    #[rasn(tag(explicit(2)))]
    ByKey(OctetString),
}

/// CRLReason ::= ENUMERATED (RFC 5280 §5.3.1). Value 7 is unassigned but
/// kept decodable; the domain layer maps it to an unknown reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsnType, Encode, Decode)]
#[rasn(enumerated)]
pub enum CrlReasonCode {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    Unassigned = 7,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl CrlReasonCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

/// RevokedInfo ::= SEQUENCE {
///     revocationTime    GeneralizedTime,
///     revocationReason  [0] EXPLICIT CRLReason OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct RevokedInfo {
    pub revocation_time: GeneralizedTime,
    #[rasn(tag(explicit(0)))]
    pub revocation_reason: Option<CrlReasonCode>,
}

/// CertStatus ::= CHOICE {
///     good     [0] IMPLICIT NULL,
///     revoked  [1] IMPLICIT RevokedInfo,
///     unknown  [2] IMPLICIT UnknownInfo
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
#[rasn(choice)]
pub enum CertStatus {
    #[rasn(tag(0))]
    Good(()),
    #[rasn(tag(1))]
    Revoked(RevokedInfo),
    #[rasn(tag(2))]
    Unknown(()),
}

/// SingleResponse ::= SEQUENCE {
///     certID            CertID,
///     certStatus        CertStatus,
///     thisUpdate        GeneralizedTime,
///     nextUpdate        [0] EXPLICIT GeneralizedTime OPTIONAL,
///     singleExtensions  [1] EXPLICIT Extensions OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct SingleResponse {
    pub cert_id: CertId,
    pub cert_status: CertStatus,
    pub this_update: GeneralizedTime,
    #[rasn(tag(explicit(0)))]
    pub next_update: Option<GeneralizedTime>,
    #[rasn(tag(explicit(1)))]
    pub single_extensions: Option<Extensions>,
}

/// ResponseData ::= SEQUENCE {
///     version             [0] EXPLICIT Version DEFAULT v1,
///     responderID         ResponderID,
///     producedAt          GeneralizedTime,
///     responses           SEQUENCE OF SingleResponse,
///     responseExtensions  [1] EXPLICIT Extensions OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct ResponseData {
    #[rasn(tag(explicit(0)))]
    pub version: Option<Integer>,
    pub responder_id: ResponderId,
    pub produced_at: GeneralizedTime,
    pub responses: SequenceOf<SingleResponse>,
    #[rasn(tag(explicit(1)))]
    pub response_extensions: Option<Extensions>,
}

/// BasicOCSPResponse ::= SEQUENCE {
///     tbsResponseData     ResponseData,
///     signatureAlgorithm  AlgorithmIdentifier,
///     signature           BIT STRING,
///     certs               [0] EXPLICIT SEQUENCE OF Certificate OPTIONAL
/// }
#[derive(Debug, Clone, AsnType, Encode, Decode)]
pub struct BasicOcspResponse {
    pub tbs_response_data: ResponseData,
    pub signature_algorithm: AlgorithmIdentifier,
    pub signature: BitString,
    #[rasn(tag(explicit(0)))]
    pub certs: Option<SequenceOf<Any>>,
}

/// Decode a DER value, mapping to the caller's error space at the edge.
pub fn decode<T: Decode>(der: &[u8]) -> Result<T, DecodeError> {
    rasn::der::decode(der)
}

/// Encode a value to DER.
pub fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, EncodeError> {
    rasn::der::encode(value)
}

/// Build the RFC 6960 nonce request extension around raw nonce bytes.
pub fn nonce_extension(nonce: &[u8]) -> Result<Extension, EncodeError> {
    let inner = rasn::der::encode(&OctetString::from(nonce.to_vec()))?;
    Ok(Extension {
        extn_id: Oid::new_unchecked(oid::ID_PKIX_OCSP_NONCE.into()),
        critical: false,
        extn_value: inner.into(),
    })
}

/// Extract the nonce bytes from a response's extensions, if present.
///
/// The extension value should be a DER OCTET STRING wrapping the nonce;
/// responders that embed the raw bytes are tolerated.
pub fn extract_nonce(extensions: &Extensions) -> Option<Vec<u8>> {
    let ext = extensions
        .iter()
        .find(|e| e.extn_id.as_ref() == oid::ID_PKIX_OCSP_NONCE)?;
    match rasn::der::decode::<OctetString>(ext.extn_value.as_ref()) {
        Ok(inner) => Some(inner.to_vec()),
        Err(_) => Some(ext.extn_value.to_vec()),
    }
}
