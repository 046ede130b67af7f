// src/templates.rs
use crate::{
    models::relatorio::RelatorioAula,
    services::relatorio_service::formatar_hora,
};
use askama::Template;

/// Linha já formatada para o template (o askama escapa o HTML).
pub struct LinhaRelatorioView {
    pub aluno: String,
    pub responsavel: String,
    pub entrada: String,
    pub saida: String,
    pub retirado_por: String,
    pub entrada_inferida: bool,
    pub liberado_por_admin: bool,
}

#[derive(Template)]
#[template(path = "relatorio.html")]
pub struct RelatorioPage {
    pub aula_id: i64,
    pub tema: String,
    pub professores: String,
    pub iniciada_em: String,
    pub encerrada_em: String,
    pub linhas: Vec<LinhaRelatorioView>,
    pub total: usize,
    pub entradas: usize,
    pub saidas: usize,
    pub presentes: usize,
}

impl From<&RelatorioAula> for RelatorioPage {
    fn from(r: &RelatorioAula) -> Self {
        let linhas = r
            .linhas
            .iter()
            .map(|l| LinhaRelatorioView {
                aluno: l.aluno_nome.clone(),
                responsavel: l.responsavel.clone().unwrap_or_default(),
                entrada: formatar_hora(l.entrada.as_ref()),
                saida: formatar_hora(l.saida.as_ref()),
                retirado_por: l.retirado_por.clone().unwrap_or_default(),
                entrada_inferida: l.entrada_inferida,
                liberado_por_admin: l.liberado_por_admin,
            })
            .collect();
        Self {
            aula_id: r.aula.id,
            tema: r.aula.tema.clone(),
            professores: r.aula.professores.clone(),
            iniciada_em: formatar_hora(Some(&r.aula.iniciada_em)),
            encerrada_em: formatar_hora(r.aula.encerrada_em.as_ref()),
            linhas,
            total: r.resumo.total,
            entradas: r.resumo.entradas,
            saidas: r.resumo.saidas,
            presentes: r.resumo.presentes,
        }
    }
}
