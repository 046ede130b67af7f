// src/services/relatorio_service.rs
use crate::{
    error::AppResult,
    models::relatorio::{RelatorioAula, ResumoAula},
    services::aula_service,
};
use chrono::{DateTime, Local, Utc};
use sqlx::SqlitePool;

/// Junta aula + frequência + nomes dos alunos. Só leitura.
pub async fn relatorio_aula(db_pool: &SqlitePool, aula_id: i64) -> AppResult<RelatorioAula> {
    let aula = aula_service::get_aula(db_pool, aula_id).await?;
    let linhas = aula_service::list_frequencia(db_pool, aula_id).await?;
    let resumo = ResumoAula::calcular(&linhas);
    tracing::debug!(
        "Relatório da aula {}: {} linhas ({} presentes)",
        aula_id,
        resumo.total,
        resumo.presentes
    );
    Ok(RelatorioAula { aula, linhas, resumo })
}

/// Formata um instante na hora local do servidor (`dd/mm/AAAA HH:MM`), ou vazio.
pub fn formatar_hora(instante: Option<&DateTime<Utc>>) -> String {
    instante
        .map(|dt| dt.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

fn campo_csv(valor: &str) -> String {
    if valor.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", valor.replace('"', "\"\""))
    } else {
        valor.to_string()
    }
}

fn sim_nao(v: bool) -> &'static str {
    if v {
        "sim"
    } else {
        "não"
    }
}

/// Exporta o relatório em CSV (uma linha por aluno, com cabeçalho).
pub fn relatorio_csv(relatorio: &RelatorioAula) -> String {
    let mut out = String::from(
        "aluno,responsavel,entrada,saida,retirado_por,entrada_inferida,liberado_por_admin\r\n",
    );
    for l in &relatorio.linhas {
        let campos = [
            campo_csv(&l.aluno_nome),
            campo_csv(l.responsavel.as_deref().unwrap_or_default()),
            campo_csv(&formatar_hora(l.entrada.as_ref())),
            campo_csv(&formatar_hora(l.saida.as_ref())),
            campo_csv(l.retirado_por.as_deref().unwrap_or_default()),
            sim_nao(l.entrada_inferida).to_string(),
            sim_nao(l.liberado_por_admin).to_string(),
        ];
        out.push_str(&campos.join(","));
        out.push_str("\r\n");
    }
    out
}
