pub mod factory;
pub mod memory;
pub mod store;
pub mod valkey;

pub use factory::build_nonce_store;
pub use memory::MemoryNonceStore;
pub use store::{NonceError, NonceResult, NonceStatus, NonceStore};
pub use valkey::ValkeyNonceStore;
