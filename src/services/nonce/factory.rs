/// Factory: build the configured `NonceStore` from application `Config`.
use std::sync::Arc;

use tracing::{error, info};

use crate::config::{Config, NonceBackend};
use crate::error::AppError;
use crate::services::nonce::{MemoryNonceStore, NonceStore, ValkeyNonceStore};

pub async fn build_nonce_store(config: &Config) -> Result<Arc<dyn NonceStore>, AppError> {
    match &config.nonce_backend {
        NonceBackend::Memory { sweep_interval } => {
            let store = Arc::new(MemoryNonceStore::new(config.nonce_ttl));
            // Detached: lives as long as the runtime.
            store.clone().spawn_sweeper(*sweep_interval);

            info!(ttl_secs = config.nonce_ttl.as_secs(), "using in-memory sso nonce store");
            Ok(store as Arc<dyn NonceStore>)
        }
        NonceBackend::Valkey { url } => {
            let store = ValkeyNonceStore::connect(url, config.nonce_ttl)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to connect sso nonce store");
                    AppError::Internal
                })?;

            info!(ttl_secs = config.nonce_ttl.as_secs(), "using valkey sso nonce store");
            Ok(Arc::new(store))
        }
    }
}
