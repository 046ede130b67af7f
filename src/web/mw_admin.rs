// src/web/mw_admin.rs
use crate::{error::AppError, models::usuario::Principal};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// Middleware que só deixa passar admins.
/// Deve ser executado *depois* do middleware `require_auth`.
pub async fn require_admin(
    Extension(principal): Extension<Principal>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if principal.is_admin() {
        tracing::debug!("Admin MW: Acesso admin concedido para {}", principal.usuario);
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            "Admin MW: Acesso negado para {} (role {}).",
            principal.usuario,
            principal.role
        );
        Err(AppError::forbidden("Apenas administradores podem fazer esta operação"))
    }
}
