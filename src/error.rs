// src/error.rs
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Erro ao renderizar template: {0}")]
    Template(#[from] askama::Error),

    // --- Erros de autenticação (401) ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token ausente")]
    TokenMissing,

    #[error("Token expirado")]
    TokenExpired,

    #[error("Token inválido")]
    TokenInvalid,

    // --- Erros de negócio ---
    #[error("{0}")]
    Validation(String),

    #[error("Corpo JSON inválido: {}", .0.body_text())]
    JsonBody(#[from] JsonRejection),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Erro interno inesperado")]
    InternalServerError,
}

impl AppError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::JsonBody(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::TokenMissing
            | AppError::TokenExpired
            | AppError::TokenInvalid => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Corpo JSON das respostas de erro: `{"success": false, "error": "..."}`.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

// Como converter AppError numa resposta HTTP
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();

        // Erros 5xx: loga o detalhe mas devolve uma mensagem genérica ao cliente
        let user_message = match &self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => {
                "Erro ao aceder aos dados.".to_string()
            }
            AppError::Config(_) => "Erro de configuração.".to_string(),
            AppError::PasswordHashingError => "Erro ao processar credenciais.".to_string(),
            AppError::Template(_) => "Erro ao gerar o relatório.".to_string(),
            AppError::InternalServerError => "Ocorreu um erro inesperado.".to_string(),
            // Mensagem genérica para login falhado (não revela se o utilizador existe)
            AppError::InvalidCredentials => "Usuário ou senha inválidos".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, detail = ?self, "pedido falhou");
        } else {
            tracing::debug!(status = %status, message = %user_message, "pedido rejeitado");
        }

        let body = Json(ErrorBody {
            success: false,
            error: user_message,
        });
        (status, body).into_response()
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;

/// Verifica se um erro do sqlx é violação de UNIQUE (códigos SQLite 19 / 2067 / 1555).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|c| c == "19" || c == "2067" || c == "1555"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InternalServerError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
