// src/web/aviso_handlers.rs
use crate::{
    error::AppResult,
    models::{
        aviso::{Aviso, Comentario, EstadoLike, FixarPayload, NovoAviso, NovoComentario},
        usuario::Principal,
    },
    services::aviso_service,
    state::AppState,
    web::{ok, ApiResponse, AppJson},
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

// GET /api/avisos
pub async fn list_avisos(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<ApiResponse<Vec<Aviso>>>> {
    Ok(ok(aviso_service::list_avisos(&state.db_pool, principal.id).await?))
}

// POST /api/avisos
pub async fn create_aviso(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<NovoAviso>,
) -> AppResult<(StatusCode, Json<ApiResponse<Aviso>>)> {
    let aviso = aviso_service::create_aviso(&state.db_pool, &principal, payload).await?;
    Ok((StatusCode::CREATED, ok(aviso)))
}

// DELETE /api/avisos/{id} (admin)
pub async fn delete_aviso(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<ApiResponse<Value>>> {
    aviso_service::delete_aviso(&state.db_pool, id).await?;
    Ok(ok(json!({ "id": id })))
}

// POST /api/avisos/{id}/fixar (admin)
pub async fn fixar_aviso(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<FixarPayload>,
) -> AppResult<Json<ApiResponse<Value>>> {
    aviso_service::set_fixado(&state.db_pool, id, payload.fixado).await?;
    Ok(ok(json!({ "id": id, "fixado": payload.fixado })))
}

// POST /api/avisos/{id}/like
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<EstadoLike>>> {
    Ok(ok(aviso_service::toggle_like(&state.db_pool, id, principal.id).await?))
}

// GET /api/avisos/{id}/comentarios
pub async fn list_comentarios(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<Comentario>>>> {
    Ok(ok(aviso_service::list_comentarios(&state.db_pool, id).await?))
}

// POST /api/avisos/{id}/comentarios
pub async fn add_comentario(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<NovoComentario>,
) -> AppResult<(StatusCode, Json<ApiResponse<Comentario>>)> {
    let comentario = aviso_service::add_comentario(&state.db_pool, id, &principal, &payload.texto).await?;
    Ok((StatusCode::CREATED, ok(comentario)))
}

// DELETE /api/comentarios/{id} (autor ou admin)
pub async fn delete_comentario(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Value>>> {
    aviso_service::delete_comentario(&state.db_pool, id, &principal).await?;
    Ok(ok(json!({ "id": id })))
}
