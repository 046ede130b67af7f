// src/config.rs
use crate::error::{AppError, AppResult};
use std::{env, fmt::Display, net::SocketAddr, str::FromStr};

const DEFAULT_DATABASE_URL: &str = "sqlite://ieq.db";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_DAYS: &str = "30";
pub const DEFAULT_ADMIN_SENHA: &str = "1234";
/// Validade máxima dos tokens (10 anos).
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Configuração lida das variáveis de ambiente (com `.env` carregado pelo main).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub token_secret: String,
    pub token_ttl_days: i64,
    /// Quando definido, o CORS só aceita esta origem
    pub cors_origin: Option<String>,
    pub admin: AdminBootstrap,
}

/// Conta de administrador criada no arranque se ainda não existir nenhum admin.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub usuario: String,
    pub senha: String,
    pub nome: String,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let token_secret = env::var("TOKEN_SECRET")
            .map_err(|_| AppError::Config("TOKEN_SECRET não definida".into()))?;
        if token_secret.trim().is_empty() {
            return Err(AppError::Config("TOKEN_SECRET está vazia".into()));
        }
        if token_secret.len() < 32 {
            tracing::warn!("⚠️ TOKEN_SECRET é curta, considere usar uma chave mais longa e aleatória!");
        }

        let token_ttl_days = validar_ttl(parse_var("TOKEN_TTL_DAYS", DEFAULT_TOKEN_TTL_DAYS)?)?;

        let admin = AdminBootstrap {
            usuario: var_or("ADMIN_USUARIO", "admin"),
            senha: var_or("ADMIN_SENHA", DEFAULT_ADMIN_SENHA),
            nome: var_or("ADMIN_NOME", "Administrador"),
        };

        Ok(Self {
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            bind_addr: parse_var("BIND_ADDR", DEFAULT_BIND_ADDR)?,
            token_secret,
            token_ttl_days,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|s| !s.trim().is_empty()),
            admin,
        })
    }
}

fn validar_ttl(dias: i64) -> AppResult<i64> {
    if (1..=MAX_TOKEN_TTL_DAYS).contains(&dias) {
        Ok(dias)
    } else {
        Err(AppError::Config(format!(
            "TOKEN_TTL_DAYS deve estar entre 1 e {MAX_TOKEN_TTL_DAYS} (recebido {dias})"
        )))
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        tracing::info!("{key} não definida, usando default: {default}");
        default.to_string()
    })
}

fn parse_var<T: FromStr>(key: &str, default: &str) -> AppResult<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> AppResult<T>
where
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("valor inválido para {key} ({raw}): {e}")))
}
