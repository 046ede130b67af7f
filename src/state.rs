// src/state.rs
use crate::services::token_service::TokenSigner;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    // Assinatura dos tokens bearer (JWT por omissão)
    pub tokens: Arc<dyn TokenSigner>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, tokens: Arc<dyn TokenSigner>) -> Self {
        Self { db_pool, tokens }
    }
}

// Permite extrair o pool da DB diretamente
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}
