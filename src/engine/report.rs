use super::outcome::{RevocationMethod, SourceOutcome};

/// What a single revocation check did and concluded.
///
/// Overwritten on every call; callers snapshot via
/// `RevocationEngine::last_report`.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Policy the check ran under.
    pub policy: String,
    /// Sources consulted, in the order they were tried.
    pub methods_tried: Vec<RevocationMethod>,
    /// Per-source status labels (`good`, `revoked`, `unknown`, `*_error`).
    pub ocsp_status: Option<String>,
    pub crl_status: Option<String>,
    /// Per-source error messages, when a source failed.
    pub ocsp_error: Option<String>,
    pub crl_error: Option<String>,
    /// Final verdict; `None` when the check errored out.
    pub result: Option<bool>,
}

impl CheckReport {
    pub fn new(policy: &str) -> Self {
        Self {
            policy: policy.to_string(),
            ..Default::default()
        }
    }

    /// Record one source's outcome.
    pub fn record(&mut self, method: RevocationMethod, outcome: &SourceOutcome) {
        self.methods_tried.push(method);
        let status = outcome.status_label().to_string();
        let error = outcome.error_message().map(|m| m.to_string());
        match method {
            RevocationMethod::Ocsp => {
                self.ocsp_status = Some(status);
                self.ocsp_error = error;
            }
            RevocationMethod::Crl => {
                self.crl_status = Some(status);
                self.crl_error = error;
            }
        }
    }

    pub fn tried(&self, method: RevocationMethod) -> bool {
        self.methods_tried.contains(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_order_and_errors() {
        let mut report = CheckReport::new("ocsp_preferred");
        report.record(
            RevocationMethod::Ocsp,
            &SourceOutcome::TransportFailure("connect timeout".into()),
        );
        report.record(RevocationMethod::Crl, &SourceOutcome::Good);

        assert_eq!(
            report.methods_tried,
            vec![RevocationMethod::Ocsp, RevocationMethod::Crl]
        );
        assert_eq!(report.ocsp_status.as_deref(), Some("transport_error"));
        assert_eq!(report.ocsp_error.as_deref(), Some("connect timeout"));
        assert_eq!(report.crl_status.as_deref(), Some("good"));
        assert_eq!(report.crl_error, None);
    }
}
