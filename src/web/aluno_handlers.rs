// src/web/aluno_handlers.rs
use crate::{
    error::AppResult,
    models::aluno::{Aluno, AlunoFiltro, AlunoPayload},
    services::aluno_service,
    state::AppState,
    web::{ok, ApiResponse, AppJson},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

// GET /api/alunos?busca=
pub async fn list_alunos(
    State(state): State<AppState>,
    Query(filtro): Query<AlunoFiltro>,
) -> AppResult<Json<ApiResponse<Vec<Aluno>>>> {
    let alunos = aluno_service::list_alunos(&state.db_pool, filtro.busca.as_deref()).await?;
    Ok(ok(alunos))
}

// GET /api/alunos/{id}
pub async fn get_aluno(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<ApiResponse<Aluno>>> {
    Ok(ok(aluno_service::get_aluno(&state.db_pool, id).await?))
}

// POST /api/alunos
pub async fn create_aluno(
    State(state): State<AppState>,
    AppJson(payload): AppJson<AlunoPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<Aluno>>)> {
    let aluno = aluno_service::create_aluno(&state.db_pool, payload).await?;
    Ok((StatusCode::CREATED, ok(aluno)))
}

// PUT /api/alunos/{id}
pub async fn update_aluno(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(payload): AppJson<AlunoPayload>,
) -> AppResult<Json<ApiResponse<Aluno>>> {
    Ok(ok(aluno_service::update_aluno(&state.db_pool, id, payload).await?))
}

// DELETE /api/alunos/{id}
pub async fn delete_aluno(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<ApiResponse<Value>>> {
    aluno_service::delete_aluno(&state.db_pool, id).await?;
    Ok(ok(json!({ "id": id })))
}
