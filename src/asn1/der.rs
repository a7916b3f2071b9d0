//! Minimal DER TLV helpers.
//!
//! Signed PKIX structures (`CertificateList`, `Certificate`,
//! `BasicOCSPResponse`) all share the outer shape
//! `SEQUENCE { tbs, signatureAlgorithm, signature BIT STRING }`. Signature
//! verification must cover the exact bytes the signer produced, so the TBS
//! and algorithm fields are located as byte ranges into the original buffer
//! instead of being re-encoded.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerError {
    #[error("truncated DER input")]
    Truncated,

    #[error("unsupported or invalid DER length")]
    BadLength,

    #[error("unexpected tag {0:#04x}")]
    UnexpectedTag(u8),
}

/// A byte range into an enclosing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: usize,
    pub len: usize,
}

impl ByteRange {
    pub fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.offset..self.offset + self.len]
    }
}

/// The three components of a signed DER structure, as ranges into the
/// original buffer plus the unwrapped signature bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSequence {
    /// Full TLV span of the to-be-signed portion.
    pub tbs: ByteRange,
    /// Full TLV span of the signature AlgorithmIdentifier.
    pub signature_algorithm: ByteRange,
    /// BIT STRING contents with the unused-bits octet stripped.
    pub signature: Vec<u8>,
}

/// Tag, header length and content length of the TLV starting at `at`.
fn read_header(buf: &[u8], at: usize) -> Result<(u8, usize, usize), DerError> {
    if at + 2 > buf.len() {
        return Err(DerError::Truncated);
    }
    let tag = buf[at];
    let first = buf[at + 1];
    if first < 0x80 {
        return Ok((tag, 2, first as usize));
    }
    // DER forbids the indefinite form
    let num_octets = (first & 0x7f) as usize;
    if num_octets == 0 || num_octets > 4 {
        return Err(DerError::BadLength);
    }
    if at + 2 + num_octets > buf.len() {
        return Err(DerError::Truncated);
    }
    let mut len: usize = 0;
    for &b in &buf[at + 2..at + 2 + num_octets] {
        len = (len << 8) | b as usize;
    }
    Ok((tag, 2 + num_octets, len))
}

/// Full span of the TLV starting at `at`.
fn read_tlv(buf: &[u8], at: usize) -> Result<(u8, ByteRange, ByteRange), DerError> {
    let (tag, header_len, content_len) = read_header(buf, at)?;
    let total = ByteRange {
        offset: at,
        len: header_len + content_len,
    };
    let content = ByteRange {
        offset: at + header_len,
        len: content_len,
    };
    if content.offset + content.len > buf.len() {
        return Err(DerError::Truncated);
    }
    Ok((tag, total, content))
}

/// Split `SEQUENCE { tbs, signatureAlgorithm, signature }` into its parts.
pub fn split_signed_sequence(raw: &[u8]) -> Result<SignedSequence, DerError> {
    let (tag, outer, content) = read_tlv(raw, 0)?;
    if tag != 0x30 {
        return Err(DerError::UnexpectedTag(tag));
    }
    let end = outer.offset + outer.len;

    let (_, tbs, _) = read_tlv(raw, content.offset)?;
    let (alg_tag, signature_algorithm, _) = read_tlv(raw, tbs.offset + tbs.len)?;
    if alg_tag != 0x30 {
        return Err(DerError::UnexpectedTag(alg_tag));
    }
    let (sig_tag, sig_total, sig_content) =
        read_tlv(raw, signature_algorithm.offset + signature_algorithm.len)?;
    if sig_tag != 0x03 {
        return Err(DerError::UnexpectedTag(sig_tag));
    }
    if sig_total.offset + sig_total.len > end {
        return Err(DerError::Truncated);
    }
    if sig_content.len == 0 {
        return Err(DerError::BadLength);
    }
    // First content octet of a BIT STRING is the unused-bit count
    let signature = sig_content.slice(raw)[1..].to_vec();

    Ok(SignedSequence {
        tbs,
        signature_algorithm,
        signature,
    })
}

/// Contents of the subjectPublicKey BIT STRING inside a DER-encoded
/// SubjectPublicKeyInfo, with the unused-bits octet stripped.
pub fn spki_key_bits(spki_der: &[u8]) -> Result<Vec<u8>, DerError> {
    let (tag, _, content) = read_tlv(spki_der, 0)?;
    if tag != 0x30 {
        return Err(DerError::UnexpectedTag(tag));
    }
    let (_, algorithm, _) = read_tlv(spki_der, content.offset)?;
    let (bs_tag, _, bs_content) = read_tlv(spki_der, algorithm.offset + algorithm.len)?;
    if bs_tag != 0x03 {
        return Err(DerError::UnexpectedTag(bs_tag));
    }
    if bs_content.len == 0 {
        return Err(DerError::BadLength);
    }
    Ok(bs_content.slice(spki_der)[1..].to_vec())
}

/// Tag and content of a single TLV expected to fill `value` exactly.
pub fn single_tlv(value: &[u8]) -> Result<(u8, &[u8]), DerError> {
    let (tag, total, content) = read_tlv(value, 0)?;
    if total.len != value.len() {
        return Err(DerError::BadLength);
    }
    Ok((tag, content.slice(value)))
}

/// Contents of a DER INTEGER with the sign octet normalized away.
pub fn integer_bytes(value: &[u8]) -> Result<Vec<u8>, DerError> {
    let (tag, content) = single_tlv(value)?;
    if tag != 0x02 {
        return Err(DerError::UnexpectedTag(tag));
    }
    let mut bytes = content;
    while bytes.len() > 1 && bytes[0] == 0x00 {
        bytes = &bytes[1..];
    }
    Ok(bytes.to_vec())
}

/// Value of a DER ENUMERATED, tolerating a bare single-byte encoding.
pub fn enumerated_value(value: &[u8]) -> Option<u8> {
    if value.len() >= 3 && value[0] == 0x0A && value[1] == 0x01 {
        Some(value[2])
    } else if value.len() == 1 {
        // Sometimes it's just the raw value
        Some(value[0])
    } else {
        None
    }
}
