// src/web/mod.rs
pub mod aluno_handlers;
pub mod auth_handlers;
pub mod aula_handlers;
pub mod aviso_handlers;
pub mod mw_admin;
pub mod mw_auth;
pub mod relatorio_handlers;
pub mod routes;
pub mod usuario_handlers;

use crate::error::AppError;
use axum::{extract::FromRequest, Json};
use serde::Serialize;

/// `Json` cujas rejeições (corpo inválido, campo em falta) saem como `AppError`,
/// com o mesmo corpo `{"success": false, "error": ...}` dos outros erros.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Envelope das respostas de sucesso: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}
