pub mod cache;
pub mod nonce;
pub mod sso;
