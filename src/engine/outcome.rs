use time::OffsetDateTime;

use crate::crl::RevocationReason;

/// Which revocation source produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationMethod {
    Ocsp,
    Crl,
}

impl RevocationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ocsp => "ocsp",
            Self::Crl => "crl",
        }
    }
}

/// Outcome of consulting one revocation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Good,
    Revoked {
        reason: Option<RevocationReason>,
        revoked_at: OffsetDateTime,
    },
    /// The responder answered but does not know the certificate.
    Unknown,
    /// Network, TLS or timeout failure; retryable.
    TransportFailure(String),
    /// Well-formed exchange violating the protocol.
    ProtocolFailure(String),
    /// Preconditions missing: no URL, stale data, absent evidence.
    PolicyFailure(String),
}

impl SourceOutcome {
    /// Good and Revoked are conclusive; everything else leaves the status
    /// open.
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Good | Self::Revoked { .. })
    }

    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TransportFailure(_) | Self::ProtocolFailure(_) | Self::PolicyFailure(_)
        )
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Revoked { .. } => "revoked",
            Self::Unknown => "unknown",
            Self::TransportFailure(_) => "transport_error",
            Self::ProtocolFailure(_) => "protocol_error",
            Self::PolicyFailure(_) => "policy_error",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::TransportFailure(message)
            | Self::ProtocolFailure(message)
            | Self::PolicyFailure(message) => Some(message),
            _ => None,
        }
    }
}
