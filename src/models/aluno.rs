// src/models/aluno.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Criança registada no ministério.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Aluno {
    pub id: i64,
    pub nome: String,
    pub data_nascimento: Option<String>, // texto livre, como vem do formulário
    pub responsavel: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
    // Até três pessoas autorizadas a retirar a criança
    pub autorizado_retirar: Option<String>,
    pub autorizado_2: Option<String>,
    pub autorizado_3: Option<String>,
    pub foto: Option<String>,
    pub ativo: bool,
    pub criado_em: DateTime<Utc>,
}

impl Aluno {
    /// Nomes autorizados não vazios.
    pub fn autorizados(&self) -> Vec<&str> {
        [&self.autorizado_retirar, &self.autorizado_2, &self.autorizado_3]
            .into_iter()
            .filter_map(|n| n.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Verifica se `nome` pode retirar a criança.
    ///
    /// Sem nenhum autorizado registado, qualquer nome é aceite. Caso contrário a
    /// comparação é exata, ignorando maiúsculas/minúsculas e espaços nas pontas.
    pub fn pode_ser_retirado_por(&self, nome: &str) -> bool {
        let autorizados = self.autorizados();
        if autorizados.is_empty() {
            return true;
        }
        let alvo = nome.trim().to_lowercase();
        autorizados.iter().any(|a| a.to_lowercase() == alvo)
    }
}

/// Campos aceites em criação e edição de alunos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlunoPayload {
    #[serde(default)]
    pub nome: String,
    pub data_nascimento: Option<String>,
    pub responsavel: Option<String>,
    pub telefone: Option<String>,
    pub observacoes: Option<String>,
    pub autorizado_retirar: Option<String>,
    pub autorizado_2: Option<String>,
    pub autorizado_3: Option<String>,
    pub foto: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlunoFiltro {
    pub busca: Option<String>,
}
