/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::sso::SsoService;

#[derive(Clone, Debug)]
pub struct AppState {
    pub sso: Arc<SsoService>,
}

impl AppState {
    pub fn new(sso: Arc<SsoService>) -> Self {
        Self { sso }
    }
}
