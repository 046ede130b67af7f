// src/web/auth_handlers.rs
use crate::{
    error::AppResult,
    models::usuario::{AlterarSenhaPayload, LoginPayload, LoginResponse, Principal, UsuarioInfo},
    services::auth_service,
    state::AppState,
    web::{ok, ApiResponse, AppJson},
};
use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};

// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    tracing::info!("Tentativa de login para: {}", payload.usuario);

    let (token, user) = auth_service::login(
        &state.db_pool,
        state.tokens.as_ref(),
        &payload.usuario,
        &payload.senha,
    )
    .await?;

    Ok(ok(LoginResponse {
        token,
        user: UsuarioInfo::from(&user),
    }))
}

// GET /api/me
pub async fn handle_me(Extension(principal): Extension<Principal>) -> Json<ApiResponse<Principal>> {
    ok(principal)
}

// PUT /api/me/senha
pub async fn handle_alterar_senha(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<AlterarSenhaPayload>,
) -> AppResult<Json<ApiResponse<Value>>> {
    auth_service::alterar_propria_senha(
        &state.db_pool,
        principal.id,
        &payload.senha_atual,
        &payload.nova_senha,
    )
    .await?;
    Ok(ok(json!({ "alterada": true })))
}

// GET /api/health
pub async fn handle_health() -> Json<ApiResponse<Value>> {
    ok(json!({ "status": "ok" }))
}
