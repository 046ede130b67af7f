// src/models/usuario.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};

/// Papel de um membro da equipe.
/// Sai sempre em minúsculas; na entrada aceita as grafias de `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Professor,
    Auxiliar,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Professor => "professor",
            Role::Auxiliar => "auxiliar",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    // Aceita maiúsculas/minúsculas e a grafia "auxiliary"/"professora" de versões antigas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrador" => Ok(Role::Admin),
            "professor" | "professora" => Ok(Role::Professor),
            "auxiliar" | "auxiliary" => Ok(Role::Auxiliar),
            other => Err(format!("role desconhecida: {other}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// Representa um utilizador lido da tabela 'usuarios'
#[derive(Debug, Clone, FromRow)]
pub struct Usuario {
    pub id: i64,
    pub nome: String,
    pub usuario: String,
    pub senha_hash: String,
    pub role: Role,
    pub foto: Option<String>,
    pub ativo: bool,
    pub criado_em: DateTime<Utc>,
}

/// Vista pública do utilizador (sem hash da senha).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsuarioInfo {
    pub id: i64,
    pub nome: String,
    pub usuario: String,
    pub role: Role,
    pub foto: Option<String>,
}

impl From<&Usuario> for UsuarioInfo {
    fn from(u: &Usuario) -> Self {
        Self {
            id: u.id,
            nome: u.nome.clone(),
            usuario: u.usuario.clone(),
            role: u.role,
            foto: u.foto.clone(),
        }
    }
}

/// Identidade autenticada extraída do token e posta nas extensões do pedido.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Principal {
    pub id: i64,
    pub usuario: String,
    pub nome: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&Usuario> for Principal {
    fn from(u: &Usuario) -> Self {
        Self {
            id: u.id,
            usuario: u.usuario.clone(),
            nome: u.nome.clone(),
            role: u.role,
        }
    }
}

// Struct para dados do login (campos em português, como o front-end envia)
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub usuario: String,
    #[serde(default)]
    pub senha: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UsuarioInfo,
}

#[derive(Debug, Deserialize)]
pub struct NovoUsuario {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub usuario: String,
    #[serde(default)]
    pub senha: String,
    pub role: Option<Role>,
    pub foto: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AtualizarUsuario {
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub usuario: String,
    pub role: Option<Role>,
    pub foto: Option<String>,
    /// Nova senha opcional; vazia mantém a atual
    pub senha: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlterarSenhaPayload {
    #[serde(default)]
    pub senha_atual: String,
    #[serde(default)]
    pub nova_senha: String,
}
