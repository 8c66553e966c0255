use std::{future::Future, pin::Pin};

use crate::services::cache::CacheError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type NonceResult<T> = Result<T, NonceError>;

/// Return path recorded when a caller does not supply one.
pub const DEFAULT_RETURN_PATH: &str = "/";

/// Random bytes per nonce (128 bits).
const NONCE_BYTES: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum NonceError {
    #[error("payload does not carry a nonce")]
    Missing,
    #[error("nonce is not known")]
    Unknown,
    #[error("nonce has expired")]
    Expired,
    #[error("nonce was already used")]
    Consumed,
    #[error("failed to gather entropy for nonce")]
    Entropy,
    #[error(transparent)]
    Backend(#[from] CacheError),
}

/// Lifecycle state of a nonce as seen by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceStatus {
    Live { return_path: String },
    Consumed,
    Expired,
    // Never issued, already purged, or (for TTL-evicting backends) expired.
    Unknown,
}

impl NonceStatus {
    /// Fail closed on anything but a live nonce; yields the recorded return path.
    pub fn into_live(self) -> NonceResult<String> {
        match self {
            NonceStatus::Live { return_path } => Ok(return_path),
            NonceStatus::Consumed => Err(NonceError::Consumed),
            NonceStatus::Expired => Err(NonceError::Expired),
            NonceStatus::Unknown => Err(NonceError::Unknown),
        }
    }
}

/// One-time token store guarding the SSO handshake against replay.
///
/// Every method must be safe under concurrent callers:
/// - two `issue` calls never hand out the same nonce
/// - for a given nonce, exactly one `consume` call returns `Ok(true)`
///
/// Backend failures surface as `Err` and callers must treat them as an
/// invalid nonce (fail-closed).
pub trait NonceStore: Send + Sync {
    // Backend name for logging.
    fn backend_name(&self) -> &'static str;

    // Mint a nonce, record it as live together with `return_path`, return it.
    fn issue<'a>(&'a self, return_path: &'a str) -> BoxFuture<'a, NonceResult<String>>;

    fn status<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<NonceStatus>>;

    // Mark the nonce as spent. Idempotent.
    //
    // Returns:
    // - Ok(true)  => this call moved the nonce from live to consumed
    // - Ok(false) => nonce was not live (unknown, expired or already consumed)
    fn consume<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<bool>>;

    fn generate(&self) -> BoxFuture<'_, NonceResult<String>> {
        self.issue(DEFAULT_RETURN_PATH)
    }

    fn is_valid<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<bool>> {
        Box::pin(async move {
            Ok(matches!(
                self.status(nonce).await?,
                NonceStatus::Live { .. }
            ))
        })
    }

    fn return_path<'a>(&'a self, nonce: &'a str) -> BoxFuture<'a, NonceResult<Option<String>>> {
        Box::pin(async move {
            match self.status(nonce).await? {
                NonceStatus::Live { return_path } => Ok(Some(return_path)),
                _ => Ok(None),
            }
        })
    }
}

/// 128 bits from the OS CSPRNG, lowercase hex.
pub fn generate_token() -> NonceResult<String> {
    let mut bytes = [0u8; NONCE_BYTES];
    getrandom::fill(&mut bytes).map_err(|_| NonceError::Entropy)?;
    Ok(hex::encode(bytes))
}
