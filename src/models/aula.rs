// src/models/aula.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// --- Estruturas que espelham as tabelas `aulas` e `frequencia` ---

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Aula {
    pub id: i64,
    pub tema: String,
    pub professores: String, // nomes separados por vírgula
    pub iniciada_em: DateTime<Utc>,
    pub encerrada_em: Option<DateTime<Utc>>, // NULL enquanto a aula está aberta
    pub iniciada_por: Option<i64>,
}

impl Aula {
    pub fn esta_aberta(&self) -> bool {
        self.encerrada_em.is_none()
    }
}

/// Estado do ciclo de vida das aulas: nenhuma aberta, ou exatamente uma.
#[derive(Debug, Clone, PartialEq)]
pub enum EstadoAula {
    Nenhuma,
    Ativa(Aula),
}

impl EstadoAula {
    pub fn into_aula(self) -> Option<Aula> {
        match self {
            EstadoAula::Nenhuma => None,
            EstadoAula::Ativa(aula) => Some(aula),
        }
    }
}

/// Resultado de `iniciar_aula`: a nova aula e a que foi fechada para lhe dar lugar.
#[derive(Debug, Clone, Serialize)]
pub struct TransicaoAula {
    pub aula: Aula,
    pub encerrada: Option<Aula>,
}

/// Linha de presença de um aluno numa aula.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Frequencia {
    pub id: i64,
    pub aula_id: i64,
    pub aluno_id: i64,
    pub entrada: Option<DateTime<Utc>>,
    pub saida: Option<DateTime<Utc>>,
    pub retirado_por: Option<String>,
    /// A entrada foi preenchida pela saída (aluno nunca fez check-in)
    pub entrada_inferida: bool,
    pub liberado_por_admin: bool,
}

/// Frequência com o nome do aluno, para listas e relatórios.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FrequenciaAluno {
    pub id: i64,
    pub aula_id: i64,
    pub aluno_id: i64,
    pub aluno_nome: String,
    pub responsavel: Option<String>,
    pub entrada: Option<DateTime<Utc>>,
    pub saida: Option<DateTime<Utc>>,
    pub retirado_por: Option<String>,
    pub entrada_inferida: bool,
    pub liberado_por_admin: bool,
}

// --- Payloads da API ---

#[derive(Debug, Deserialize)]
pub struct IniciarAulaPayload {
    #[serde(default)]
    pub tema: String,
    #[serde(default)]
    pub professores: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EncerrarAulaPayload {
    pub aula_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EntradaPayload {
    pub aula_id: Option<i64>,
    pub aluno_id: i64,
}

/// A saída aceita o id da linha de frequência ou o par (aula, aluno).
#[derive(Debug, Deserialize)]
pub struct SaidaPayload {
    pub frequencia_id: Option<i64>,
    pub aula_id: Option<i64>,
    pub aluno_id: Option<i64>,
    #[serde(default)]
    pub retirado_por: String,
    #[serde(default)]
    pub forcar: bool,
}

/// Referência à linha de frequência a fechar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFrequencia {
    Id(i64),
    Par { aula_id: i64, aluno_id: i64 },
}

impl SaidaPayload {
    pub fn referencia(&self) -> Option<RefFrequencia> {
        match (self.frequencia_id, self.aula_id, self.aluno_id) {
            (Some(id), _, _) => Some(RefFrequencia::Id(id)),
            (None, Some(aula_id), Some(aluno_id)) => Some(RefFrequencia::Par { aula_id, aluno_id }),
            _ => None,
        }
    }
}
