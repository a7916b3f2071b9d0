use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use num_bigint::{BigInt, Sign};
use rand::RngCore;
use rasn::prelude::{Any, Integer, ObjectIdentifier as Oid, OctetString};
use rasn_pkix::AlgorithmIdentifier;

use crate::asn1::ocsp as wire;
use crate::cert::CertificateSource;
use crate::crypto::{HashAlgorithm, hash};

use super::errors::{OcspError, OcspResult};

/// DER encoding of ASN.1 NULL, the algorithm parameter RFC 6960 requests
/// carry alongside the hash OID.
const NULL_DER: [u8; 2] = [0x05, 0x00];

/// The 4-tuple identifying a certificate to an OCSP responder
/// (RFC 6960 §4.1.1).
///
/// The name hash covers the issuer's canonical subject Name DER; the key
/// hash covers the raw subjectPublicKey bits, not the whole SPKI. The hash
/// algorithm bound here is the one that produced both hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CertId {
    pub hash_algorithm: HashAlgorithm,
    pub issuer_name_hash: Vec<u8>,
    pub issuer_key_hash: Vec<u8>,
    /// Serial number as canonical lowercase big-endian hex.
    pub serial_hex: String,
}

impl CertId {
    pub fn new(
        subject: &CertificateSource,
        issuer: &CertificateSource,
        algorithm: HashAlgorithm,
    ) -> OcspResult<Self> {
        let issuer_name_hash = hash(algorithm, &issuer.subject_dn_der()?);
        let issuer_key_hash = hash(algorithm, &issuer.spki_key_bits()?);
        Ok(Self {
            hash_algorithm: algorithm,
            issuer_name_hash,
            issuer_key_hash,
            serial_hex: subject.serial_hex()?,
        })
    }

    /// Wire form of this CertID.
    pub(crate) fn to_wire(&self) -> OcspResult<wire::CertId> {
        let serial_bytes = hex::decode(&self.serial_hex)
            .map_err(|e| OcspError::Encode(format!("invalid serial hex: {e}")))?;
        Ok(wire::CertId {
            hash_algorithm: AlgorithmIdentifier {
                algorithm: Oid::new_unchecked(self.hash_algorithm.oid_components().into()),
                parameters: Some(Any::new(NULL_DER.to_vec())),
            },
            issuer_name_hash: OctetString::from(self.issuer_name_hash.clone()),
            issuer_key_hash: OctetString::from(self.issuer_key_hash.clone()),
            serial_number: Integer::from(BigInt::from_bytes_be(Sign::Plus, &serial_bytes)),
        })
    }

    /// Whether a wire CertID echoed by a responder identifies the same
    /// certificate (algorithm parameters are not significant).
    pub(crate) fn matches_wire(&self, other: &wire::CertId) -> bool {
        match self.to_wire() {
            Ok(own) => own.matches(other),
            Err(_) => false,
        }
    }
}

/// A built OCSP request: DER bytes plus the identifying state needed to
/// match and validate the response. Constructed per check; disposable.
#[derive(Debug, Clone)]
pub struct OcspRequest {
    pub cert_id: CertId,
    /// Request nonce, hex-encoded; `None` when nonces are disabled.
    pub nonce_hex: Option<String>,
    der: Vec<u8>,
}

impl OcspRequest {
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.der)
    }

    /// HTTP GET URL form: base URL joined with a single `/` and the
    /// base64-encoded request.
    pub fn get_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.to_base64())
    }

    pub fn nonce_bytes(&self) -> Option<Vec<u8>> {
        self.nonce_hex.as_ref().and_then(|n| hex::decode(n).ok())
    }
}

/// Builds unsigned single-certificate OCSP requests.
#[derive(Debug, Clone)]
pub struct OcspRequestBuilder {
    hash_algorithm: HashAlgorithm,
    use_nonce: bool,
}

impl OcspRequestBuilder {
    pub fn new(hash_algorithm: HashAlgorithm, use_nonce: bool) -> Self {
        Self {
            hash_algorithm,
            use_nonce,
        }
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Build the DER request for `cert_id`, generating a fresh 16-byte
    /// nonce unless disabled.
    pub fn build(&self, cert_id: CertId) -> OcspResult<OcspRequest> {
        let nonce = if self.use_nonce {
            let mut bytes = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut bytes);
            Some(bytes)
        } else {
            None
        };

        let request_extensions = match nonce {
            Some(ref bytes) => Some(rasn_pkix::Extensions::from(vec![
                wire::nonce_extension(bytes).map_err(|e| OcspError::Encode(e.to_string()))?,
            ])),
            None => None,
        };

        let request = wire::OcspRequest {
            tbs_request: wire::TbsRequest {
                version: None,
                requestor_name: None,
                request_list: vec![wire::Request {
                    req_cert: cert_id.to_wire()?,
                    single_request_extensions: None,
                }],
                request_extensions,
            },
            optional_signature: None,
        };

        let der = wire::encode(&request).map_err(|e| OcspError::Encode(e.to_string()))?;

        Ok(OcspRequest {
            cert_id,
            nonce_hex: nonce.map(|bytes| hex::encode(bytes)),
            der,
        })
    }
}
