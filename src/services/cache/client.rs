//! Key/value client interface used by shared-state services (SSO nonces).
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (transport/command).
///
/// Kept independent from `AppError` so callers decide how to fail.
/// The nonce store always fails closed on these.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// A small string-based key/value interface.
///
/// The SSO nonce lifecycle only needs:
/// - `SET NX EX` to register a fresh nonce
/// - `GET` to inspect it
/// - `SET XX KEEPTTL GET` to swap in a tombstone atomically
///
/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Backend name for logging.
    fn backend_name(&self) -> &'static str;

    // Get UTF-8 string value.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    // Set value if the key does not exist, with TTL.
    //
    // Returns:
    // - `Ok(true)`  if the key was set
    // - `Ok(false)` if the key already exists
    async fn set_if_absent_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> CacheResult<bool>;

    // Overwrite an existing key, keeping its remaining TTL, and return the
    // previous value. Missing keys are left untouched and yield `Ok(None)`.
    async fn replace_keep_ttl(&self, key: &str, value: &str) -> CacheResult<Option<String>>;
}
