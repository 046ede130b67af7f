// src/models/aviso.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Aviso do mural, já com contadores para a listagem.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Aviso {
    pub id: i64,
    pub mensagem: Option<String>,
    pub imagem: Option<String>,
    pub autor_id: Option<i64>,
    pub autor_nome: String,
    pub fixado: bool,
    pub criado_em: DateTime<Utc>,
    pub likes: i64,
    pub comentarios: i64,
    /// O utilizador que fez o pedido deu like?
    pub curtido: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comentario {
    pub id: i64,
    pub aviso_id: i64,
    pub usuario_id: i64,
    pub usuario_nome: String,
    pub texto: String,
    pub criado_em: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstadoLike {
    pub curtido: bool,
    pub likes: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct NovoAviso {
    pub mensagem: Option<String>,
    pub imagem: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NovoComentario {
    #[serde(default)]
    pub texto: String,
}

#[derive(Debug, Deserialize)]
pub struct FixarPayload {
    #[serde(default = "default_fixado")]
    pub fixado: bool,
}

fn default_fixado() -> bool {
    true
}
