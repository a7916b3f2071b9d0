use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::asn1::der as asn1_der;
use crate::asn1::ocsp as wire;
use crate::asn1::oid;
use crate::crl::RevocationReason;

use super::errors::{OcspError, OcspResult};
use super::request::CertId;

pub use crate::asn1::ocsp::OcspResponseStatus;

/// Certificate status carried by a single OCSP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcspCertStatus {
    Good,
    Revoked {
        revoked_at: OffsetDateTime,
        reason: Option<RevocationReason>,
    },
    Unknown,
}

/// Who signed the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcspResponderId {
    /// DER of the responder Name.
    ByName(Vec<u8>),
    /// SHA-1 hash of the responder's public key bits.
    ByKey(Vec<u8>),
}

/// A successful OCSP response, reduced to the single response matching the
/// requested CertID.
#[derive(Debug, Clone)]
pub struct ParsedOcspResponse {
    pub response_status: OcspResponseStatus,
    pub cert_status: OcspCertStatus,
    pub produced_at: OffsetDateTime,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    /// Nonce echoed by the responder, hex-encoded.
    pub nonce_hex: Option<String>,
    pub responder_id: OcspResponderId,
    /// DER of the signature AlgorithmIdentifier, sliced from the original
    /// response bytes.
    pub signature_algorithm_der: Vec<u8>,
    /// Signature BIT STRING contents.
    pub signature_bits: Vec<u8>,
    /// Exact bytes of tbsResponseData as the responder emitted them.
    pub tbs_bytes: Vec<u8>,
    /// The request CertID this single response was matched against.
    pub matched_cert_id: CertId,
    /// Responder certificates included with the response, as DER.
    pub responder_certs_der: Vec<Vec<u8>>,
    /// Wire-invariant violations observed while parsing.
    pub warnings: Vec<String>,
}

impl ParsedOcspResponse {
    /// Whether a cached copy is still usable at `now`.
    pub fn usable_at(&self, now: OffsetDateTime) -> bool {
        match self.next_update {
            Some(next_update) => now <= next_update,
            None => false,
        }
    }
}

/// Decode an OCSP response and select the single response matching
/// `request_cert_id`.
///
/// Only `successful` responses carry a body; any other status is surfaced
/// as `ResponderStatus`. A body whose responseType is not
/// id-pkix-ocsp-basic, or that contains no single response for the
/// requested CertID, is a protocol failure.
pub fn parse_response(der: &[u8], request_cert_id: &CertId) -> OcspResult<ParsedOcspResponse> {
    let response: wire::OcspResponse =
        wire::decode(der).map_err(|e| OcspError::Decode(format!("OCSPResponse: {e}")))?;

    if response.status != OcspResponseStatus::Successful {
        return Err(OcspError::ResponderStatus(response.status));
    }

    let response_bytes = response
        .response_bytes
        .ok_or_else(|| OcspError::Decode("successful response without responseBytes".into()))?;

    if response_bytes.response_type.as_ref() != oid::ID_PKIX_OCSP_BASIC {
        return Err(OcspError::Decode(format!(
            "unsupported OCSP response type {:?}",
            response_bytes.response_type
        )));
    }

    let basic_der: &[u8] = response_bytes.response.as_ref();
    let basic: wire::BasicOcspResponse =
        wire::decode(basic_der).map_err(|e| OcspError::Decode(format!("BasicOCSPResponse: {e}")))?;

    // The signature covers the exact tbsResponseData bytes; recover them by
    // TLV slicing rather than re-encoding.
    let split = asn1_der::split_signed_sequence(basic_der)
        .map_err(|e| OcspError::Decode(format!("malformed BasicOCSPResponse framing: {e}")))?;
    let tbs_bytes = split.tbs.slice(basic_der).to_vec();
    let signature_algorithm_der = split.signature_algorithm.slice(basic_der).to_vec();
    let signature_bits = split.signature;

    let data = &basic.tbs_response_data;

    let single = data
        .responses
        .iter()
        .find(|single| request_cert_id.matches_wire(&single.cert_id))
        .ok_or(OcspError::CertIdMismatch)?;

    let produced_at = generalized_to_offset(&data.produced_at)?;
    let this_update = generalized_to_offset(&single.this_update)?;
    let next_update = match &single.next_update {
        Some(t) => Some(generalized_to_offset(t)?),
        None => None,
    };

    let mut warnings = Vec::new();
    if this_update > produced_at {
        let message = format!(
            "thisUpdate {this_update} is later than producedAt {produced_at}"
        );
        warn!("{message}");
        warnings.push(message);
    }
    if let Some(next) = next_update
        && next <= this_update
    {
        let message = format!("nextUpdate {next} does not follow thisUpdate {this_update}");
        warn!("{message}");
        warnings.push(message);
    }

    let cert_status = match &single.cert_status {
        wire::CertStatus::Good(()) => OcspCertStatus::Good,
        wire::CertStatus::Revoked(info) => OcspCertStatus::Revoked {
            revoked_at: generalized_to_offset(&info.revocation_time)?,
            reason: info
                .revocation_reason
                .and_then(|code| RevocationReason::from_u8(code.code())),
        },
        wire::CertStatus::Unknown(()) => OcspCertStatus::Unknown,
    };

    let nonce_hex = data
        .response_extensions
        .as_ref()
        .and_then(wire::extract_nonce)
        .map(hex::encode);

    let responder_id = match &data.responder_id {
        wire::ResponderId::ByName(name) => OcspResponderId::ByName(name.as_ref().to_vec()),
        wire::ResponderId::ByKey(key_hash) => OcspResponderId::ByKey(key_hash.to_vec()),
    };

    let responder_certs_der = basic
        .certs
        .as_ref()
        .map(|certs| certs.iter().map(|any| any.as_ref().to_vec()).collect())
        .unwrap_or_default();

    debug!(
        "Parsed OCSP single response: status {:?}, thisUpdate {this_update}",
        cert_status
    );

    Ok(ParsedOcspResponse {
        response_status: response.status,
        cert_status,
        produced_at,
        this_update,
        next_update,
        nonce_hex,
        responder_id,
        signature_algorithm_der,
        signature_bits,
        tbs_bytes,
        matched_cert_id: request_cert_id.clone(),
        responder_certs_der,
        warnings,
    })
}

fn generalized_to_offset(t: &rasn::types::GeneralizedTime) -> OcspResult<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(t.timestamp())
        .map_err(|e| OcspError::Decode(format!("timestamp out of range: {e}")))
}
