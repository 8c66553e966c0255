use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{task::JoinHandle, time::Instant};
use tracing::debug;

use crate::services::nonce::store::{
    BoxFuture, NonceResult, NonceStatus, NonceStore, generate_token,
};

#[derive(Debug)]
struct NonceRecord {
    return_path: String,
    issued_at: Instant,
    consumed: bool,
}

/// In-process nonce store for single-process deployments.
///
/// Expiry is decided at read time. Consumed nonces are kept until their TTL
/// runs out so a replay reports `Consumed` rather than `Unknown`; after that
/// `purge_expired` (or the sweeper task) drops them.
#[derive(Debug)]
pub struct MemoryNonceStore {
    records: Mutex<HashMap<String, NonceRecord>>,
    ttl: Duration,
}

impl MemoryNonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    // Records are plain data, so a poisoned lock is still consistent.
    fn records(&self) -> MutexGuard<'_, HashMap<String, NonceRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, record: &NonceRecord, now: Instant) -> bool {
        now.saturating_duration_since(record.issued_at) >= self.ttl
    }

    /// Number of records currently held (live, consumed or not yet purged).
    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record past its TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| !self.is_expired(record, now));
        before - records.len()
    }

    /// Periodically purge expired records until the returned handle is aborted.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    debug!(removed, "purged expired sso nonces");
                }
            }
        })
    }

    fn issue_now(&self, return_path: &str) -> NonceResult<String> {
        loop {
            let nonce = generate_token()?;
            let now = Instant::now();

            let mut records = self.records();
            if let Entry::Vacant(slot) = records.entry(nonce.clone()) {
                slot.insert(NonceRecord {
                    return_path: return_path.to_string(),
                    issued_at: now,
                    consumed: false,
                });
                return Ok(nonce);
            }
            // 128-bit collision; draw again.
        }
    }

    fn status_now(&self, nonce: &str) -> NonceStatus {
        let now = Instant::now();
        let records = self.records();

        match records.get(nonce) {
            None => NonceStatus::Unknown,
            Some(record) if record.consumed => NonceStatus::Consumed,
            Some(record) if self.is_expired(record, now) => NonceStatus::Expired,
            Some(record) => NonceStatus::Live {
                return_path: record.return_path.clone(),
            },
        }
    }

    fn consume_now(&self, nonce: &str) -> bool {
        let now = Instant::now();
        let mut records = self.records();

        match records.get_mut(nonce) {
            // An expired record stays `Expired`; it was never used.
            Some(record) if !record.consumed && !self.is_expired(record, now) => {
                record.consumed = true;
                true
            }
            _ => false,
        }
    }
}

impl NonceStore for MemoryNonceStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn issue<'a>(&'a self, return_path: &'a str) -> BoxFuture<'a, NonceResult<String>> {
        Box::pin(async move { self.issue_now(return_path) })
    }

    fn status<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<NonceStatus>> {
        Box::pin(async move { Ok(self.status_now(nonce)) })
    }

    fn consume<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<bool>> {
        Box::pin(async move { Ok(self.consume_now(nonce)) })
    }
}
