use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::crypto::HashAlgorithm;
use crate::engine::RevocationPolicy;

/// Settings for the revocation subsystem.
///
/// All values have defaults matching common deployments; `load()` layers an
/// optional `config/settings.*` file and `APP_`-prefixed environment
/// variables on top of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationSettings {
    /// How OCSP and CRL verdicts are combined into one decision.
    #[serde(default)]
    pub policy: RevocationPolicy,
    pub ocsp: OcspSettings,
    pub crl: CrlSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcspSettings {
    /// TCP/TLS connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_s: u64,
    /// Total response timeout in seconds.
    #[serde(default = "default_response_timeout")]
    pub response_timeout_s: u64,
    /// Include a random nonce in each request for replay protection.
    #[serde(default = "default_true")]
    pub use_nonce: bool,
    /// Hash algorithm used to build the request CertID.
    #[serde(default = "default_certid_hash")]
    pub certid_hash: HashAlgorithm,
    /// Accepted clock skew for `thisUpdate` freshness checks, in seconds.
    #[serde(default = "default_clock_skew")]
    pub clock_skew_tolerance_s: u64,
    /// Cache successful responses until their `nextUpdate`.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrlSettings {
    /// HTTP timeout for CRL downloads in seconds.
    #[serde(default = "default_crl_fetch_timeout")]
    pub fetch_timeout_s: u64,
    /// Maximum number of CRLs kept in the cache.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    /// Cached CRLs are refreshed after this many seconds even when their
    /// `nextUpdate` is still in the future.
    #[serde(default = "default_soft_ttl")]
    pub cache_soft_ttl_s: u64,
    /// A cached CRL expiring within this many seconds triggers a refetch.
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_s: u64,
}

impl Default for RevocationSettings {
    fn default() -> Self {
        Self {
            policy: RevocationPolicy::default(),
            ocsp: OcspSettings::default(),
            crl: CrlSettings::default(),
        }
    }
}

impl Default for OcspSettings {
    fn default() -> Self {
        Self {
            connect_timeout_s: default_connect_timeout(),
            response_timeout_s: default_response_timeout(),
            use_nonce: true,
            certid_hash: default_certid_hash(),
            clock_skew_tolerance_s: default_clock_skew(),
            cache_enabled: true,
        }
    }
}

impl Default for CrlSettings {
    fn default() -> Self {
        Self {
            fetch_timeout_s: default_crl_fetch_timeout(),
            cache_max_entries: default_cache_max_entries(),
            cache_soft_ttl_s: default_soft_ttl(),
            refresh_threshold_s: default_refresh_threshold(),
        }
    }
}

impl RevocationSettings {
    pub fn load() -> Result<Self, ConfigError> {
        // Build the config
        let config = ConfigLib::builder()
            // Set default values
            .set_default("policy", "ocsp_preferred")?
            .set_default("ocsp.connect_timeout_s", 5)?
            .set_default("ocsp.response_timeout_s", 10)?
            .set_default("ocsp.use_nonce", true)?
            .set_default("ocsp.certid_hash", "sha1")?
            .set_default("ocsp.clock_skew_tolerance_s", 300)?
            .set_default("ocsp.cache_enabled", true)?
            .set_default("crl.fetch_timeout_s", 30)?
            .set_default("crl.cache_max_entries", 100)?
            .set_default("crl.cache_soft_ttl_s", 3600)?
            .set_default("crl.refresh_threshold_s", 3600)?
            // Add a config file under config/settings.toml
            // or any other format supported by `config` crate
            .add_source(File::with_name("config/settings").required(false))
            // Allow overrides via environment variables prefixed with 'APP_'
            // Example: APP_OCSP__CONNECT_TIMEOUT_S=3
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

impl OcspSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_s)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_s)
    }

    pub fn clock_skew_tolerance(&self) -> Duration {
        Duration::from_secs(self.clock_skew_tolerance_s)
    }
}

impl CrlSettings {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_s)
    }

    pub fn cache_soft_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_soft_ttl_s)
    }

    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_s)
    }
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_response_timeout() -> u64 {
    10
}

fn default_certid_hash() -> HashAlgorithm {
    HashAlgorithm::Sha1
}

fn default_clock_skew() -> u64 {
    300
}

fn default_crl_fetch_timeout() -> u64 {
    30
}

fn default_cache_max_entries() -> usize {
    100
}

fn default_soft_ttl() -> u64 {
    3600
}

fn default_refresh_threshold() -> u64 {
    3600
}
