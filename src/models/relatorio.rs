// src/models/relatorio.rs
use crate::models::aula::{Aula, FrequenciaAluno};
use serde::Serialize;

/// Estatísticas de uma aula.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ResumoAula {
    pub total: usize,
    pub entradas: usize,  // alunos com check-in
    pub saidas: usize,    // alunos já retirados
    pub presentes: usize, // entraram e ainda não saíram
}

impl ResumoAula {
    pub fn calcular(linhas: &[FrequenciaAluno]) -> Self {
        let entradas = linhas.iter().filter(|l| l.entrada.is_some()).count();
        let saidas = linhas.iter().filter(|l| l.saida.is_some()).count();
        let presentes = linhas
            .iter()
            .filter(|l| l.entrada.is_some() && l.saida.is_none())
            .count();
        Self {
            total: linhas.len(),
            entradas,
            saidas,
            presentes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatorioAula {
    pub aula: Aula,
    pub linhas: Vec<FrequenciaAluno>,
    pub resumo: ResumoAula,
}
