use std::collections::HashMap;
use std::io::Cursor;

use ::time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};
use tracing::{debug, warn};
use x509_parser::oid_registry;
use x509_parser::pem::Pem;
use x509_parser::prelude::*;

use crate::asn1::der as asn1_der;
use crate::asn1::oid;

use super::errors::{CrlError, CrlResult};
use super::types::{CrlNumber, CrlRevokedEntry, ParsedCrl, RevocationReason};

/// Parse a CRL from either a PEM envelope or raw DER, sniffing the first
/// bytes for the PEM preamble.
pub fn parse_crl(bytes: &[u8], source_url: Option<String>) -> CrlResult<ParsedCrl> {
    if bytes.starts_with(b"-----BEGIN") {
        parse_crl_pem(bytes, source_url)
    } else {
        parse_crl_der(bytes.to_vec(), source_url)
    }
}

/// Parse a CRL from a PEM envelope bearing the `X509 CRL` label.
pub fn parse_crl_pem(pem_bytes: &[u8], source_url: Option<String>) -> CrlResult<ParsedCrl> {
    let mut cursor = Cursor::new(pem_bytes);
    let (pem, _) = Pem::read(&mut cursor).map_err(|_| CrlError::PemEnvelope)?;
    if pem.label != "X509 CRL" {
        return Err(CrlError::PemEnvelope);
    }
    parse_crl_der(pem.contents, source_url)
}

/// Parse a CRL from raw DER bytes, retaining the buffer and the byte ranges
/// needed for later signature verification.
pub fn parse_crl_der(der: Vec<u8>, source_url: Option<String>) -> CrlResult<ParsedCrl> {
    let (remaining, crl) = CertificateRevocationList::from_der(&der)
        .map_err(|e| CrlError::Parse(format!("DER parsing failed: {e}")))?;
    if !remaining.is_empty() {
        return Err(CrlError::Parse(
            "trailing data after CertificateList".to_string(),
        ));
    }

    let issuer_dn = crl.tbs_cert_list.issuer.to_string();
    let issuer_dn_der = crl.tbs_cert_list.issuer.as_raw().to_vec();
    let this_update = crl.tbs_cert_list.this_update.to_datetime();
    let next_update = crl.tbs_cert_list.next_update.map(|t| t.to_datetime());

    let mut crl_number = None;
    for ext in crl.tbs_cert_list.extensions() {
        if ext.oid == oid_registry::OID_X509_EXT_CRL_NUMBER {
            let bytes = asn1_der::integer_bytes(ext.value)
                .map_err(|e| CrlError::Parse(format!("invalid CRL Number extension: {e}")))?;
            crl_number = Some(CrlNumber::from_be_bytes(&bytes));
        }
    }
    let crl_number = crl_number.unwrap_or_else(|| {
        warn!("CRL from {issuer_dn} has no CRL Number extension, defaulting to 0");
        CrlNumber::zero()
    });

    let mut entries = HashMap::new();
    for revoked in &crl.tbs_cert_list.revoked_certificates {
        let serial_hex = hex::encode(revoked.user_certificate.to_bytes_be());
        let revocation_date = revoked.revocation_date.to_datetime();

        let mut reason = None;
        let mut invalidity_date = None;
        for ext in revoked.extensions() {
            if ext.oid == oid_registry::OID_X509_EXT_REASON_CODE {
                // The reason code is an ENUMERATED value; unassigned codes
                // (7 in particular) surface as no known reason
                reason = asn1_der::enumerated_value(ext.value).and_then(RevocationReason::from_u8);
            } else if ext.oid.to_id_string() == oid::INVALIDITY_DATE_STR {
                invalidity_date = parse_time_value(ext.value);
            }
        }

        let entry = CrlRevokedEntry {
            serial_hex: serial_hex.clone(),
            revocation_date,
            reason,
            invalidity_date,
        };
        if entries.insert(serial_hex.clone(), entry).is_some() {
            return Err(CrlError::Parse(format!(
                "duplicate serial number {serial_hex} in CRL"
            )));
        }
    }

    let split = asn1_der::split_signed_sequence(&der)
        .map_err(|e| CrlError::Parse(format!("malformed CertificateList framing: {e}")))?;

    debug!(
        "Parsed CRL from {issuer_dn}: number {crl_number}, {} entries",
        entries.len()
    );

    Ok(ParsedCrl {
        raw: der,
        tbs: split.tbs,
        signature_algorithm: split.signature_algorithm,
        signature: split.signature,
        issuer_dn,
        issuer_dn_der,
        this_update,
        next_update,
        crl_number,
        entries,
        fetched_at: OffsetDateTime::now_utc(),
        source_url,
    })
}

/// Parse a DER Time (UTCTime or GeneralizedTime TLV) extension value.
fn parse_time_value(value: &[u8]) -> Option<OffsetDateTime> {
    let (tag, content) = asn1_der::single_tlv(value).ok()?;
    let text = std::str::from_utf8(content).ok()?;
    parse_asn1_time_string(tag, text)
}

/// `YYMMDDHHMMSSZ` (UTCTime, tag 0x17) or `YYYYMMDDHHMMSSZ`
/// (GeneralizedTime, tag 0x18), UTC only.
fn parse_asn1_time_string(tag: u8, text: &str) -> Option<OffsetDateTime> {
    let b = text.as_bytes();
    let (year, rest) = match tag {
        0x17 => {
            if b.len() != 13 || b[12] != b'Z' {
                return None;
            }
            let yy = digits(&b[0..2])? as i32;
            // RFC 5280 §4.1.2.5.1 pivot
            let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
            (year, &b[2..12])
        }
        0x18 => {
            if b.len() != 15 || b[14] != b'Z' {
                return None;
            }
            (digits(&b[0..4])? as i32, &b[4..14])
        }
        _ => return None,
    };

    let month = Month::try_from(digits(&rest[0..2])? as u8).ok()?;
    let day = digits(&rest[2..4])? as u8;
    let hour = digits(&rest[4..6])? as u8;
    let minute = digits(&rest[6..8])? as u8;
    let second = digits(&rest[8..10])? as u8;

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

fn digits(b: &[u8]) -> Option<u32> {
    let mut value = 0u32;
    for &c in b {
        if !c.is_ascii_digit() {
            return None;
        }
        value = value * 10 + (c - b'0') as u32;
    }
    Some(value)
}
