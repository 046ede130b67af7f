// src/web/mw_auth.rs
use crate::{
    error::AppError,
    services::auth_service,
    state::AppState,
};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

/// Extrai o token do cabeçalho `Authorization: Bearer <token>`.
pub fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let valor = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AppError::TokenMissing)?
        .to_str()
        .map_err(|_| AppError::TokenInvalid)?;

    let token = valor
        .strip_prefix("Bearer ")
        .or_else(|| valor.strip_prefix("bearer "))
        .ok_or(AppError::TokenInvalid)?
        .trim();
    if token.is_empty() {
        return Err(AppError::TokenMissing);
    }
    Ok(token)
}

// Middleware que verifica o token e põe o `Principal` nas extensões do pedido
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let principal = auth_service::authenticate(&state.db_pool, state.tokens.as_ref(), token)
        .await
        .inspect_err(|e| tracing::debug!("Autenticação MW: token recusado: {}", e))?;

    tracing::debug!(
        "Autenticação MW: Utilizador '{}' ({}) autenticado. Prosseguindo...",
        principal.usuario,
        principal.role
    );
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
