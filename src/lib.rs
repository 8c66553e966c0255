//! Signed single-sign-on handshake (DiscourseConnect style).
//!
//! The protocol core lives in [`services::sso`] and [`services::nonce`] and has
//! no HTTP dependency; `app`, `api` and `middleware` wire it into a small axum
//! host.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
