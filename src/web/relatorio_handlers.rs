// src/web/relatorio_handlers.rs
use crate::{
    error::AppResult,
    models::relatorio::RelatorioAula,
    services::relatorio_service,
    state::AppState,
    templates::RelatorioPage,
    web::{ok, ApiResponse},
};
use askama::Template;
use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};

// GET /api/aulas/{id}/relatorio
pub async fn relatorio_json(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<RelatorioAula>>> {
    Ok(ok(relatorio_service::relatorio_aula(&state.db_pool, id).await?))
}

// GET /api/aulas/{id}/relatorio.csv
pub async fn relatorio_csv(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<impl IntoResponse> {
    let relatorio = relatorio_service::relatorio_aula(&state.db_pool, id).await?;
    let csv = relatorio_service::relatorio_csv(&relatorio);
    let disposition = format!("attachment; filename=\"relatorio-aula-{id}.csv\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

// GET /api/aulas/{id}/relatorio.html
pub async fn relatorio_html(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Html<String>> {
    let relatorio = relatorio_service::relatorio_aula(&state.db_pool, id).await?;
    let page = RelatorioPage::from(&relatorio);
    let html = page.render().inspect_err(|e| {
        tracing::error!("Falha ao renderizar template RelatorioPage: {}", e);
    })?;
    Ok(Html(html))
}
