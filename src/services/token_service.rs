// src/services/token_service.rs
use crate::{
    error::{AppError, AppResult},
    models::usuario::{Principal, Role},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Emite e valida os tokens bearer.
///
/// Os handlers e o middleware só conhecem este trait, por isso o mecanismo de
/// assinatura pode ser trocado sem mexer nos pontos de chamada.
pub trait TokenSigner: Send + Sync {
    fn issue(&self, principal: &Principal) -> AppResult<String>;
    fn verify(&self, token: &str) -> AppResult<Principal>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String, // id do utilizador
    jti: String,
    exp: i64,
    iat: i64,
    usuario: String,
    nome: String,
    role: Role,
}

/// JWT HS256 com segredo partilhado.
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl TokenSigner for JwtSigner {
    fn issue(&self, principal: &Principal) -> AppResult<String> {
        let now = Utc::now();
        let expira = now.checked_add_signed(self.ttl).ok_or_else(|| {
            tracing::error!(ttl = ?self.ttl, "validade do token fora do intervalo de datas");
            AppError::InternalServerError
        })?;
        let claims = Claims {
            sub: principal.id.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            exp: expira.timestamp(),
            iat: now.timestamp(),
            usuario: principal.usuario.clone(),
            nome: principal.nome.clone(),
            role: principal.role,
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!(user_id = principal.id, error = %e, "jwt encode falhou");
            AppError::InternalServerError
        })
    }

    fn verify(&self, token: &str) -> AppResult<Principal> {
        let validation = Validation::new(Algorithm::HS256);
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => {
                    tracing::debug!(error = %e, "jwt decode falhou");
                    AppError::TokenInvalid
                }
            }
        })?;
        let claims = data.claims;
        let id = claims.sub.parse::<i64>().map_err(|_| AppError::TokenInvalid)?;
        Ok(Principal {
            id,
            usuario: claims.usuario,
            nome: claims.nome,
            role: claims.role,
        })
    }
}
