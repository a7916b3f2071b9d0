use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use super::request::CertId;
use super::response::ParsedOcspResponse;

/// Per-CertID store of successful OCSP responses, usable while
/// `now <= nextUpdate`. Responses without a `nextUpdate` bound are never
/// cached.
pub struct OcspCache {
    entries: RwLock<HashMap<CertId, Arc<ParsedOcspResponse>>>,
    enabled: bool,
}

impl OcspCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            enabled,
        }
    }

    /// A still-usable cached response for `cert_id`; expired entries are
    /// dropped on access.
    pub async fn get(&self, cert_id: &CertId) -> Option<Arc<ParsedOcspResponse>> {
        if !self.enabled {
            return None;
        }
        let now = OffsetDateTime::now_utc();
        {
            let entries = self.entries.read().await;
            match entries.get(cert_id) {
                Some(response) if response.usable_at(now) => {
                    debug!("Using cached OCSP response");
                    return Some(Arc::clone(response));
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but expired
        self.entries.write().await.remove(cert_id);
        None
    }

    pub async fn put(&self, response: Arc<ParsedOcspResponse>) {
        if !self.enabled {
            return;
        }
        if !response.usable_at(OffsetDateTime::now_utc()) {
            return;
        }
        self.entries
            .write()
            .await
            .insert(response.matched_cert_id.clone(), response);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
