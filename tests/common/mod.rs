//! Shared fixtures: a small DER writer for synthetic certificates and CRLs,
//! scripted CRL/OCSP transports, and signature-verifier stand-ins.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;

use revocheck::asn1::ocsp as wire;
use revocheck::cert::CertificateSource;
use revocheck::crl::{CrlError, CrlFetch, CrlResult};
use revocheck::crypto::{SignatureError, SignatureVerifier};
use revocheck::ocsp::{OcspError, OcspResult, OcspTransport};

// ---- minimal DER writer ----

pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    if content.len() < 0x80 {
        out.push(content.len() as u8);
    } else {
        let len_bytes = content.len().to_be_bytes();
        let start = len_bytes.iter().position(|&b| b != 0).unwrap();
        out.push(0x80 | (len_bytes.len() - start) as u8);
        out.extend_from_slice(&len_bytes[start..]);
    }
    out.extend_from_slice(content);
    out
}

pub fn seq(parts: &[&[u8]]) -> Vec<u8> {
    tlv(0x30, &parts.concat())
}

pub fn set(parts: &[&[u8]]) -> Vec<u8> {
    tlv(0x31, &parts.concat())
}

pub fn context(number: u8, content: &[u8]) -> Vec<u8> {
    tlv(0xA0 | number, content)
}

pub fn null() -> Vec<u8> {
    vec![0x05, 0x00]
}

pub fn integer(bytes: &[u8]) -> Vec<u8> {
    let start = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    let mut content = bytes[start..].to_vec();
    if content.is_empty() {
        content.push(0);
    }
    if content[0] & 0x80 != 0 {
        content.insert(0, 0x00);
    }
    tlv(0x02, &content)
}

pub fn integer_u64(value: u64) -> Vec<u8> {
    integer(&value.to_be_bytes())
}

pub fn enumerated(value: u8) -> Vec<u8> {
    tlv(0x0A, &[value])
}

pub fn octet_string(content: &[u8]) -> Vec<u8> {
    tlv(0x04, content)
}

pub fn bit_string(content: &[u8]) -> Vec<u8> {
    let mut body = vec![0x00];
    body.extend_from_slice(content);
    tlv(0x03, &body)
}

pub fn printable_string(text: &str) -> Vec<u8> {
    tlv(0x13, text.as_bytes())
}

pub fn ia5_tagged(tag: u8, text: &str) -> Vec<u8> {
    tlv(tag, text.as_bytes())
}

pub fn oid(components: &[u32]) -> Vec<u8> {
    let mut content = vec![(components[0] * 40 + components[1]) as u8];
    for &component in &components[2..] {
        let mut stack = Vec::new();
        let mut value = component;
        stack.push((value & 0x7F) as u8);
        value >>= 7;
        while value > 0 {
            stack.push(0x80 | (value & 0x7F) as u8);
            value >>= 7;
        }
        stack.reverse();
        content.extend_from_slice(&stack);
    }
    tlv(0x06, &content)
}

pub fn utc_time(dt: OffsetDateTime) -> Vec<u8> {
    let text = format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}Z",
        dt.year() % 100,
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    );
    tlv(0x17, text.as_bytes())
}

pub fn generalized_time(dt: OffsetDateTime) -> Vec<u8> {
    let text = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    );
    tlv(0x18, text.as_bytes())
}

/// `CN=<common name>` as an X.501 Name.
pub fn name_cn(common_name: &str) -> Vec<u8> {
    let attribute = seq(&[&oid(&[2, 5, 4, 3]), &printable_string(common_name)]);
    seq(&[&set(&[&attribute])])
}

fn sha256_rsa_alg() -> Vec<u8> {
    seq(&[&oid(&[1, 2, 840, 113549, 1, 1, 11]), &null()])
}

fn rsa_spki(key_bits: &[u8]) -> Vec<u8> {
    seq(&[
        &seq(&[&oid(&[1, 2, 840, 113549, 1, 1, 1]), &null()]),
        &bit_string(key_bits),
    ])
}

// ---- certificate fixture ----

pub struct CertParams<'a> {
    pub serial: u64,
    pub issuer_cn: &'a str,
    pub subject_cn: &'a str,
    /// Distinguishes key material between fixtures.
    pub key_seed: u8,
    pub ocsp_url: Option<&'a str>,
    pub crl_urls: Vec<&'a str>,
    pub ocsp_signing_eku: bool,
}

impl<'a> CertParams<'a> {
    pub fn new(serial: u64, issuer_cn: &'a str, subject_cn: &'a str) -> Self {
        Self {
            serial,
            issuer_cn,
            subject_cn,
            key_seed: 0x42,
            ocsp_url: None,
            crl_urls: Vec::new(),
            ocsp_signing_eku: false,
        }
    }
}

/// A structurally valid X.509 v3 certificate with a placeholder signature.
/// Parsers accept it; signature checks are the verifier stub's business.
pub fn build_certificate(params: &CertParams<'_>) -> Vec<u8> {
    let now = OffsetDateTime::now_utc();
    let not_before = now - std::time::Duration::from_secs(86400);
    let not_after = now + std::time::Duration::from_secs(86400 * 365);

    let mut extensions: Vec<Vec<u8>> = Vec::new();

    if let Some(url) = params.ocsp_url {
        // AIA: SEQUENCE OF AccessDescription { id-ad-ocsp, URI }
        let access = seq(&[
            &oid(&[1, 3, 6, 1, 5, 5, 7, 48, 1]),
            &ia5_tagged(0x86, url),
        ]);
        let aia_value = seq(&[&access]);
        extensions.push(seq(&[
            &oid(&[1, 3, 6, 1, 5, 5, 7, 1, 1]),
            &octet_string(&aia_value),
        ]));
    }

    if !params.crl_urls.is_empty() {
        // cRLDistributionPoints: DistributionPoint with fullName URI
        let mut points: Vec<Vec<u8>> = Vec::new();
        for url in &params.crl_urls {
            let general_names = ia5_tagged(0x86, url);
            let full_name = context(0, &general_names);
            let dp_name = context(0, &full_name);
            points.push(seq(&[&dp_name]));
        }
        let refs: Vec<&[u8]> = points.iter().map(|p| p.as_slice()).collect();
        let cdp_value = seq(&refs);
        extensions.push(seq(&[&oid(&[2, 5, 29, 31]), &octet_string(&cdp_value)]));
    }

    if params.ocsp_signing_eku {
        let eku_value = seq(&[&oid(&[1, 3, 6, 1, 5, 5, 7, 3, 9])]);
        extensions.push(seq(&[&oid(&[2, 5, 29, 37]), &octet_string(&eku_value)]));
    }

    let key_bits = vec![params.key_seed; 64];

    let mut tbs_parts: Vec<Vec<u8>> = vec![
        context(0, &integer(&[2])), // v3
        integer_u64(params.serial),
        sha256_rsa_alg(),
        name_cn(params.issuer_cn),
        seq(&[&utc_time(not_before), &utc_time(not_after)]),
        name_cn(params.subject_cn),
        rsa_spki(&key_bits),
    ];
    if !extensions.is_empty() {
        let refs: Vec<&[u8]> = extensions.iter().map(|e| e.as_slice()).collect();
        tbs_parts.push(context(3, &seq(&refs)));
    }

    let refs: Vec<&[u8]> = tbs_parts.iter().map(|p| p.as_slice()).collect();
    let tbs = seq(&refs);

    seq(&[&tbs, &sha256_rsa_alg(), &bit_string(&[0xAA; 64])])
}

pub fn certificate_source(params: &CertParams<'_>) -> CertificateSource {
    CertificateSource::from_der(build_certificate(params)).expect("fixture certificate parses")
}

// ---- CRL fixture ----

pub struct CrlEntryParams {
    pub serial: u64,
    pub revoked_at: OffsetDateTime,
    pub reason: Option<u8>,
    pub invalidity_date: Option<OffsetDateTime>,
}

impl CrlEntryParams {
    pub fn new(serial: u64, revoked_at: OffsetDateTime) -> Self {
        Self {
            serial,
            revoked_at,
            reason: None,
            invalidity_date: None,
        }
    }

    pub fn with_reason(mut self, reason: u8) -> Self {
        self.reason = Some(reason);
        self
    }
}

pub struct CrlParams<'a> {
    pub issuer_cn: &'a str,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    pub crl_number: Option<u64>,
    pub entries: Vec<CrlEntryParams>,
}

impl<'a> CrlParams<'a> {
    pub fn new(issuer_cn: &'a str, crl_number: u64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            issuer_cn,
            this_update: now - std::time::Duration::from_secs(3600),
            next_update: Some(now + std::time::Duration::from_secs(3600)),
            crl_number: Some(crl_number),
            entries: Vec::new(),
        }
    }
}

/// A structurally valid CertificateList with a placeholder signature.
pub fn build_crl(params: &CrlParams<'_>) -> Vec<u8> {
    let mut revoked: Vec<Vec<u8>> = Vec::new();
    for entry in &params.entries {
        let mut entry_parts: Vec<Vec<u8>> =
            vec![integer_u64(entry.serial), utc_time(entry.revoked_at)];

        let mut entry_extensions: Vec<Vec<u8>> = Vec::new();
        if let Some(reason) = entry.reason {
            entry_extensions.push(seq(&[
                &oid(&[2, 5, 29, 21]),
                &octet_string(&enumerated(reason)),
            ]));
        }
        if let Some(invalidity) = entry.invalidity_date {
            entry_extensions.push(seq(&[
                &oid(&[2, 5, 29, 24]),
                &octet_string(&generalized_time(invalidity)),
            ]));
        }
        if !entry_extensions.is_empty() {
            let refs: Vec<&[u8]> = entry_extensions.iter().map(|e| e.as_slice()).collect();
            entry_parts.push(seq(&refs));
        }

        let refs: Vec<&[u8]> = entry_parts.iter().map(|p| p.as_slice()).collect();
        revoked.push(seq(&refs));
    }

    let mut tbs_parts: Vec<Vec<u8>> = vec![
        integer(&[1]), // v2
        sha256_rsa_alg(),
        name_cn(params.issuer_cn),
        utc_time(params.this_update),
    ];
    if let Some(next_update) = params.next_update {
        tbs_parts.push(utc_time(next_update));
    }
    if !revoked.is_empty() {
        let refs: Vec<&[u8]> = revoked.iter().map(|r| r.as_slice()).collect();
        tbs_parts.push(seq(&refs));
    }
    if let Some(number) = params.crl_number {
        let number_ext = seq(&[
            &oid(&[2, 5, 29, 20]),
            &octet_string(&integer_u64(number)),
        ]);
        tbs_parts.push(context(0, &seq(&[&number_ext])));
    }

    let refs: Vec<&[u8]> = tbs_parts.iter().map(|p| p.as_slice()).collect();
    let tbs = seq(&refs);

    seq(&[&tbs, &sha256_rsa_alg(), &bit_string(&[0xBB; 64])])
}

// ---- scripted CRL fetcher ----

pub enum FetchScript {
    Bytes(Vec<u8>),
    NotFound,
    Timeout,
}

/// CRL fetcher answering from a URL-keyed script, counting calls.
pub struct MockCrlFetch {
    responses: Mutex<HashMap<String, FetchScript>>,
    pub calls: AtomicUsize,
}

impl MockCrlFetch {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_response(url: &str, script: FetchScript) -> Self {
        let fetcher = Self::new();
        fetcher.set(url, script);
        fetcher
    }

    pub fn set(&self, url: &str, script: FetchScript) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), script);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrlFetch for MockCrlFetch {
    async fn fetch(&self, url: &str) -> CrlResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().get(url) {
            Some(FetchScript::Bytes(bytes)) => Ok(bytes.clone()),
            Some(FetchScript::NotFound) | None => Err(CrlError::NotFound(url.to_string())),
            Some(FetchScript::Timeout) => Err(CrlError::Timeout),
        }
    }
}

// ---- scripted OCSP responder ----

#[derive(Clone)]
pub enum ResponderScript {
    Status {
        status: ScriptedStatus,
        this_update_delta: i64,
        next_update_delta: Option<i64>,
        echo_nonce: bool,
        wrong_nonce: bool,
        wrong_serial: bool,
        certs: Vec<Vec<u8>>,
    },
    NonSuccess(wire::OcspResponseStatus),
    Timeout,
    HttpError,
}

#[derive(Clone)]
pub enum ScriptedStatus {
    Good,
    Revoked { reason: Option<u8>, revoked_delta: i64 },
    Unknown,
}

impl ResponderScript {
    pub fn good() -> Self {
        Self::Status {
            status: ScriptedStatus::Good,
            this_update_delta: -60,
            next_update_delta: Some(3600),
            echo_nonce: true,
            wrong_nonce: false,
            wrong_serial: false,
            certs: Vec::new(),
        }
    }

    pub fn revoked(reason: Option<u8>) -> Self {
        Self::Status {
            status: ScriptedStatus::Revoked {
                reason,
                revoked_delta: -3600,
            },
            this_update_delta: -60,
            next_update_delta: Some(3600),
            echo_nonce: true,
            wrong_nonce: false,
            wrong_serial: false,
            certs: Vec::new(),
        }
    }

    pub fn unknown() -> Self {
        Self::Status {
            status: ScriptedStatus::Unknown,
            this_update_delta: -60,
            next_update_delta: Some(3600),
            echo_nonce: true,
            wrong_nonce: false,
            wrong_serial: false,
            certs: Vec::new(),
        }
    }
}

/// OCSP transport that decodes the request and synthesizes a matching
/// response per its script.
pub struct MockResponder {
    script: Mutex<ResponderScript>,
    pub calls: AtomicUsize,
    pub last_url: Mutex<Option<String>>,
}

impl MockResponder {
    pub fn new(script: ResponderScript) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn set_script(&self, script: ResponderScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn generalized(unix: i64) -> rasn::types::GeneralizedTime {
    chrono::DateTime::from_timestamp(unix, 0)
        .expect("valid timestamp")
        .fixed_offset()
}

#[async_trait]
impl OcspTransport for MockResponder {
    async fn post(&self, url: &str, request_der: &[u8]) -> OcspResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(url.to_string());
        let script = self.script.lock().unwrap().clone();

        let request: wire::OcspRequest = wire::decode(request_der)
            .map_err(|e| OcspError::Custom(format!("mock could not decode request: {e}")))?;
        let req_cert = request.tbs_request.request_list[0].req_cert.clone();
        let request_nonce = request
            .tbs_request
            .request_extensions
            .as_ref()
            .and_then(wire::extract_nonce);

        match script {
            ResponderScript::Timeout => Err(OcspError::Timeout),
            ResponderScript::HttpError => Err(OcspError::Custom(
                "HTTP error 500 from OCSP responder".to_string(),
            )),
            ResponderScript::NonSuccess(status) => {
                let response = wire::OcspResponse {
                    status,
                    response_bytes: None,
                };
                wire::encode(&response).map_err(|e| OcspError::Custom(e.to_string()))
            }
            ResponderScript::Status {
                status,
                this_update_delta,
                next_update_delta,
                echo_nonce,
                wrong_nonce,
                wrong_serial,
                certs,
            } => {
                let now = OffsetDateTime::now_utc().unix_timestamp();

                let mut cert_id = req_cert;
                if wrong_serial {
                    cert_id.serial_number = rasn::types::Integer::from(0x0999);
                }

                let cert_status = match status {
                    ScriptedStatus::Good => wire::CertStatus::Good(()),
                    ScriptedStatus::Unknown => wire::CertStatus::Unknown(()),
                    ScriptedStatus::Revoked {
                        reason,
                        revoked_delta,
                    } => wire::CertStatus::Revoked(wire::RevokedInfo {
                        revocation_time: generalized(now + revoked_delta),
                        revocation_reason: reason.and_then(|code| match code {
                            0 => Some(wire::CrlReasonCode::Unspecified),
                            1 => Some(wire::CrlReasonCode::KeyCompromise),
                            2 => Some(wire::CrlReasonCode::CaCompromise),
                            3 => Some(wire::CrlReasonCode::AffiliationChanged),
                            4 => Some(wire::CrlReasonCode::Superseded),
                            5 => Some(wire::CrlReasonCode::CessationOfOperation),
                            6 => Some(wire::CrlReasonCode::CertificateHold),
                            7 => Some(wire::CrlReasonCode::Unassigned),
                            8 => Some(wire::CrlReasonCode::RemoveFromCrl),
                            9 => Some(wire::CrlReasonCode::PrivilegeWithdrawn),
                            10 => Some(wire::CrlReasonCode::AaCompromise),
                            _ => None,
                        }),
                    }),
                };

                let response_extensions = if echo_nonce {
                    let nonce = if wrong_nonce {
                        Some(vec![0xEE; 16])
                    } else {
                        request_nonce
                    };
                    nonce.map(|bytes| {
                        rasn_pkix::Extensions::from(vec![
                            wire::nonce_extension(&bytes).expect("nonce extension encodes"),
                        ])
                    })
                } else {
                    None
                };

                let single = wire::SingleResponse {
                    cert_id,
                    cert_status,
                    this_update: generalized(now + this_update_delta),
                    next_update: next_update_delta.map(|delta| generalized(now + delta)),
                    single_extensions: None,
                };

                let basic = wire::BasicOcspResponse {
                    tbs_response_data: wire::ResponseData {
                        version: None,
                        responder_id: wire::ResponderId::ByKey(rasn::types::OctetString::from(
                            vec![0x44; 20],
                        )),
                        produced_at: generalized(now),
                        responses: vec![single],
                        response_extensions,
                    },
                    signature_algorithm: rasn_pkix::AlgorithmIdentifier {
                        algorithm: rasn::types::ObjectIdentifier::new_unchecked(
                            vec![1, 2, 840, 113549, 1, 1, 11].into(),
                        ),
                        parameters: Some(rasn::types::Any::new(vec![0x05, 0x00])),
                    },
                    signature: rasn::types::BitString::from_slice(&[0xCC; 64]),
                    certs: if certs.is_empty() {
                        None
                    } else {
                        Some(
                            certs
                                .into_iter()
                                .map(rasn::types::Any::new)
                                .collect(),
                        )
                    },
                };
                let basic_der = wire::encode(&basic).map_err(|e| OcspError::Custom(e.to_string()))?;

                let response = wire::OcspResponse {
                    status: wire::OcspResponseStatus::Successful,
                    response_bytes: Some(wire::ResponseBytes {
                        response_type: rasn::types::ObjectIdentifier::new_unchecked(
                            vec![1, 3, 6, 1, 5, 5, 7, 48, 1, 1].into(),
                        ),
                        response: rasn::types::OctetString::from(basic_der),
                    }),
                };
                wire::encode(&response).map_err(|e| OcspError::Custom(e.to_string()))
            }
        }
    }
}

// ---- verifier stand-ins ----

/// Accepts every signature; fixtures carry placeholder signatures.
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(
        &self,
        _spki_der: &[u8],
        _algorithm_der: &[u8],
        _signature: &[u8],
        _message: &[u8],
    ) -> Result<(), SignatureError> {
        Ok(())
    }
}

/// Rejects every signature.
pub struct RejectAllVerifier;

impl SignatureVerifier for RejectAllVerifier {
    fn verify(
        &self,
        _spki_der: &[u8],
        _algorithm_der: &[u8],
        _signature: &[u8],
        _message: &[u8],
    ) -> Result<(), SignatureError> {
        Err(SignatureError::Invalid)
    }
}
