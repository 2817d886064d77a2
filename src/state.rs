// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::notifier::Notifier;
use crate::utils::jwt::TokenSigner;

/// Process-wide state assembled once at startup and injected everywhere.
/// No component builds its own pool or signing key.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub signer: TokenSigner,
    pub notifier: Arc<dyn Notifier>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for TokenSigner {
    fn from_ref(state: &AppState) -> Self {
        state.signer.clone()
    }
}

impl FromRef<AppState> for Arc<dyn Notifier> {
    fn from_ref(state: &AppState) -> Self {
        state.notifier.clone()
    }
}
