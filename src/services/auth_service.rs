// src/services/auth_service.rs
use crate::{
    error::{AppError, AppResult},
    models::usuario::{Principal, Usuario},
    services::{token_service::TokenSigner, usuario_service},
};
use sqlx::SqlitePool;

/// Verifica se a senha fornecida corresponde ao hash guardado.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verificando hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao verificar senha: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Gera um hash bcrypt para uma senha.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Gerando hash bcrypt...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Erro na task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Erro bcrypt ao gerar hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Autentica `usuario`/`senha` e emite um token. Utilizador inexistente ou
/// senha errada dão o mesmo `InvalidCredentials`.
pub async fn login(
    db_pool: &SqlitePool,
    signer: &dyn TokenSigner,
    usuario: &str,
    senha: &str,
) -> AppResult<(String, Usuario)> {
    let usuario = usuario.trim();
    if usuario.is_empty() || senha.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let user = match usuario_service::find_usuario_by_login(db_pool, usuario).await? {
        Some(u) => u,
        None => {
            tracing::warn!("Login: utilizador não encontrado: {}", usuario);
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(senha, &user.senha_hash).await? {
        tracing::warn!("Login: senha incorreta para {}", usuario);
        return Err(AppError::InvalidCredentials);
    }

    let token = signer.issue(&Principal::from(&user))?;
    tracing::info!("✅ Login bem-sucedido para: {} ({})", user.usuario, user.role);
    Ok((token, user))
}

/// Valida o token e confirma que o utilizador continua ativo.
/// O principal devolvido vem da DB, para refletir mudanças de role feitas depois do login.
pub async fn authenticate(
    db_pool: &SqlitePool,
    signer: &dyn TokenSigner,
    token: &str,
) -> AppResult<Principal> {
    let principal = signer.verify(token)?;
    match usuario_service::find_usuario_by_id(db_pool, principal.id).await? {
        Some(u) if u.ativo => Ok(Principal::from(&u)),
        _ => {
            tracing::warn!("Token de utilizador removido ou inativo: {}", principal.id);
            Err(AppError::TokenInvalid)
        }
    }
}

/// Troca a senha do próprio utilizador, exigindo a senha atual.
pub async fn alterar_propria_senha(
    db_pool: &SqlitePool,
    user_id: i64,
    senha_atual: &str,
    nova_senha: &str,
) -> AppResult<()> {
    if nova_senha.trim().is_empty() {
        return Err(AppError::validation("A nova senha não pode ser vazia"));
    }
    let user = usuario_service::find_usuario_by_id(db_pool, user_id)
        .await?
        .filter(|u| u.ativo)
        .ok_or(AppError::TokenInvalid)?;
    if !verify_password(senha_atual, &user.senha_hash).await? {
        return Err(AppError::InvalidCredentials);
    }
    usuario_service::update_usuario_password(db_pool, user_id, nova_senha).await
}
