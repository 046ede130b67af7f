// src/web/aula_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        aula::{
            Aula, EncerrarAulaPayload, EntradaPayload, Frequencia, FrequenciaAluno, IniciarAulaPayload,
            SaidaPayload, TransicaoAula,
        },
        usuario::Principal,
    },
    services::aula_service,
    state::AppState,
    web::{ok, ApiResponse, AppJson},
};
use axum::{
    body::Bytes,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HistoricoQuery {
    limite: Option<i64>,
}

// GET /api/aulas
pub async fn list_aulas(
    State(state): State<AppState>,
    Query(params): Query<HistoricoQuery>,
) -> AppResult<Json<ApiResponse<Vec<Aula>>>> {
    let aulas = aula_service::list_aulas(&state.db_pool, params.limite.unwrap_or(50)).await?;
    Ok(ok(aulas))
}

// GET /api/aulas/ativa -> data: null quando não há aula aberta
pub async fn get_aula_ativa(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Option<Aula>>>> {
    Ok(ok(aula_service::get_aula_ativa(&state.db_pool).await?))
}

// POST /api/aulas/iniciar
pub async fn iniciar_aula(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<IniciarAulaPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransicaoAula>>)> {
    let transicao =
        aula_service::iniciar_aula(&state.db_pool, &payload.tema, &payload.professores, principal.id).await?;
    Ok((StatusCode::CREATED, ok(transicao)))
}

// POST /api/aulas/encerrar  (corpo opcional: {"aula_id": N})
pub async fn encerrar_aula(State(state): State<AppState>, body: Bytes) -> AppResult<Json<ApiResponse<Aula>>> {
    let payload: EncerrarAulaPayload = if body.iter().all(u8::is_ascii_whitespace) {
        EncerrarAulaPayload::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::validation(format!("JSON inválido: {e}")))?
    };
    Ok(ok(aula_service::encerrar_aula(&state.db_pool, payload.aula_id).await?))
}

// POST /api/aulas/entrada
pub async fn marcar_entrada(
    State(state): State<AppState>,
    AppJson(payload): AppJson<EntradaPayload>,
) -> AppResult<Json<ApiResponse<Frequencia>>> {
    let frequencia = aula_service::marcar_entrada(&state.db_pool, payload.aula_id, payload.aluno_id).await?;
    Ok(ok(frequencia))
}

// POST /api/aulas/saida
pub async fn marcar_saida(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AppJson(payload): AppJson<SaidaPayload>,
) -> AppResult<Json<ApiResponse<Frequencia>>> {
    let referencia = payload
        .referencia()
        .ok_or_else(|| AppError::validation("Informe frequencia_id ou aula_id e aluno_id"))?;
    let frequencia = aula_service::marcar_saida(
        &state.db_pool,
        referencia,
        &payload.retirado_por,
        &principal,
        payload.forcar,
    )
    .await?;
    Ok(ok(frequencia))
}

// GET /api/aulas/{id}/presenca
pub async fn list_presenca(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<FrequenciaAluno>>>> {
    aula_service::get_aula(&state.db_pool, id).await?;
    Ok(ok(aula_service::list_frequencia(&state.db_pool, id).await?))
}
