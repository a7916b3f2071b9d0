use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::debug;

use super::types::ParsedCrl;

/// Bounded store of parsed CRLs keyed by issuer DN.
///
/// Two expiry notions apply: protocol expiry (`nextUpdate` has passed) and a
/// soft TTL that forces a refresh even while `nextUpdate` is still in the
/// future. Eviction removes the least-recently-inserted entry first and is
/// deterministic on insertion order.
pub struct CrlCache {
    entries: HashMap<String, CachedCrl>,
    max_entries: usize,
    soft_ttl: Duration,
    next_seq: u64,
}

struct CachedCrl {
    crl: Arc<ParsedCrl>,
    inserted_at: OffsetDateTime,
    seq: u64,
}

fn cache_key(issuer_dn_der: &[u8]) -> String {
    hex::encode(issuer_dn_der)
}

impl CrlCache {
    pub fn new(max_entries: usize, soft_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            soft_ttl,
            next_seq: 0,
        }
    }

    /// Insert a CRL, replacing any entry for the same issuer. If the cache
    /// grows beyond its bound the oldest insertion is evicted.
    pub fn put(&mut self, crl: ParsedCrl) -> Arc<ParsedCrl> {
        let key = cache_key(&crl.issuer_dn_der);
        let stored = Arc::new(crl);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            CachedCrl {
                crl: Arc::clone(&stored),
                inserted_at: OffsetDateTime::now_utc(),
                seq,
            },
        );

        while self.entries.len() > self.max_entries {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(key, _)| key.clone())
            {
                debug!("Evicting oldest cached CRL");
                self.entries.remove(&oldest);
            }
        }

        stored
    }

    /// The cached CRL for an issuer, unless the soft TTL has elapsed (the
    /// entry is then dropped to force a refresh).
    pub fn get(&mut self, issuer_dn_der: &[u8]) -> Option<Arc<ParsedCrl>> {
        let key = cache_key(issuer_dn_der);
        let entry = self.entries.get(&key)?;
        if OffsetDateTime::now_utc() > entry.inserted_at + self.soft_ttl {
            debug!("Cached CRL for issuer passed its soft TTL, dropping");
            self.entries.remove(&key);
            return None;
        }
        Some(Arc::clone(&entry.crl))
    }

    /// Like `get` but without the soft-TTL side effect; used for
    /// monotonicity comparisons where even a stale CRL must be consulted.
    pub fn peek(&self, issuer_dn_der: &[u8]) -> Option<Arc<ParsedCrl>> {
        self.entries
            .get(&cache_key(issuer_dn_der))
            .map(|entry| Arc::clone(&entry.crl))
    }

    /// True if a refresh is warranted: no cached CRL, no `nextUpdate`
    /// bound, the soft TTL has elapsed, or `nextUpdate` falls within the
    /// threshold.
    pub fn expiring_soon(&self, issuer_dn_der: &[u8], threshold: Duration) -> bool {
        let Some(entry) = self.entries.get(&cache_key(issuer_dn_der)) else {
            return true;
        };
        let now = OffsetDateTime::now_utc();
        if now > entry.inserted_at + self.soft_ttl {
            return true;
        }
        match entry.crl.next_update {
            Some(next_update) => next_update <= now + threshold,
            None => true,
        }
    }

    /// Evict every entry whose `nextUpdate` has passed. Entries without a
    /// `nextUpdate` are considered expired for cache purposes: no bound
    /// means unusable.
    pub fn remove_expired(&mut self) -> usize {
        let now = OffsetDateTime::now_utc();
        let initial_size = self.entries.len();
        self.entries.retain(|_, entry| match entry.crl.next_update {
            Some(next_update) => next_update > now,
            None => false,
        });
        let removed = initial_size - self.entries.len();
        if removed > 0 {
            debug!("Removed {removed} expired CRLs from cache");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Displayable issuer DNs currently cached.
    pub fn issuers(&self) -> Vec<String> {
        self.entries
            .values()
            .map(|entry| entry.crl.issuer_dn.clone())
            .collect()
    }

    /// Cached CRLs with their source URLs, for background refresh.
    pub fn refresh_candidates(&self) -> Vec<(Vec<u8>, String)> {
        self.entries
            .values()
            .filter_map(|entry| {
                entry
                    .crl
                    .source_url
                    .as_ref()
                    .map(|url| (entry.crl.issuer_dn_der.clone(), url.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
