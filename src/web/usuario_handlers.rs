// src/web/usuario_handlers.rs
use crate::{
    error::AppResult,
    models::usuario::{AtualizarUsuario, NovoUsuario, Principal, UsuarioInfo},
    services::usuario_service,
    state::AppState,
    web::{ok, ApiResponse, AppJson},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

// GET /api/usuarios (e /api/equipe)
pub async fn list_usuarios(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<UsuarioInfo>>>> {
    let users = usuario_service::find_all_usuarios(&state.db_pool).await?;
    Ok(ok(users.iter().map(UsuarioInfo::from).collect()))
}

// POST /api/usuarios (admin)
pub async fn create_usuario(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NovoUsuario>,
) -> AppResult<(StatusCode, Json<ApiResponse<UsuarioInfo>>)> {
    let user = usuario_service::create_usuario(&state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, ok(UsuarioInfo::from(&user))))
}

// PUT /api/usuarios/{id} (admin)
pub async fn update_usuario(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<AtualizarUsuario>,
) -> AppResult<Json<ApiResponse<UsuarioInfo>>> {
    let user = usuario_service::update_usuario(&state.db_pool, id, payload).await?;
    Ok(ok(UsuarioInfo::from(&user)))
}

// DELETE /api/usuarios/{id} (admin)
pub async fn delete_usuario(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Value>>> {
    usuario_service::delete_usuario(&state.db_pool, id, principal.id).await?;
    Ok(ok(json!({ "id": id })))
}
