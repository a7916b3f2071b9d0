use serde::{Deserialize, Serialize};

/// How OCSP and CRL verdicts are gathered and combined into one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RevocationPolicy {
    /// No revocation checking; every certificate passes.
    Disabled,
    /// OCSP is the only source; its failure fails the check.
    OcspOnly,
    /// CRL is the only source; its failure fails the check.
    CrlOnly,
    /// OCSP first, CRL consulted when OCSP is inconclusive.
    #[default]
    OcspPreferred,
    /// CRL first, OCSP consulted when CRL is inconclusive.
    CrlPreferred,
    /// Both sources consulted; total failure is tolerated (fail open).
    SoftFail,
    /// Both sources consulted; anything short of Good fails (fail closed).
    HardFail,
}

impl RevocationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::OcspOnly => "ocsp_only",
            Self::CrlOnly => "crl_only",
            Self::OcspPreferred => "ocsp_preferred",
            Self::CrlPreferred => "crl_preferred",
            Self::SoftFail => "soft_fail",
            Self::HardFail => "hard_fail",
        }
    }
}
