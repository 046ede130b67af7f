// src/services/aula_service.rs
//! Ciclo de vida das aulas e registo de entradas/saídas.
//!
//! Estados: nenhuma aula aberta, ou exatamente uma aberta (`EstadoAula`). Iniciar
//! uma aula fecha a que estiver aberta, na mesma transação, com o mesmo instante
//! que marca o início da nova. O índice único parcial `idx_aulas_uma_ativa`
//! garante o invariante ao nível da DB.
use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{
        aula::{Aula, EstadoAula, Frequencia, FrequenciaAluno, RefFrequencia, TransicaoAula},
        usuario::Principal,
    },
    services::aluno_service,
};
use chrono::Utc;
use sqlx::SqlitePool;

const AULA_COLUMNS: &str = "id, tema, professores, iniciada_em, encerrada_em, iniciada_por";
const FREQUENCIA_COLUMNS: &str =
    "id, aula_id, aluno_id, entrada, saida, retirado_por, entrada_inferida, liberado_por_admin";

/// Estado atual: a aula aberta mais recente, se houver.
pub async fn estado_atual(db_pool: &SqlitePool) -> AppResult<EstadoAula> {
    let sql = format!(
        "SELECT {AULA_COLUMNS} FROM aulas WHERE encerrada_em IS NULL ORDER BY id DESC LIMIT 1"
    );
    let aula = sqlx::query_as::<_, Aula>(&sql).fetch_optional(db_pool).await?;
    Ok(match aula {
        Some(aula) => EstadoAula::Ativa(aula),
        None => EstadoAula::Nenhuma,
    })
}

pub async fn get_aula_ativa(db_pool: &SqlitePool) -> AppResult<Option<Aula>> {
    Ok(estado_atual(db_pool).await?.into_aula())
}

pub async fn find_aula_by_id(db_pool: &SqlitePool, aula_id: i64) -> AppResult<Option<Aula>> {
    let sql = format!("SELECT {AULA_COLUMNS} FROM aulas WHERE id = ?1");
    let aula = sqlx::query_as::<_, Aula>(&sql)
        .bind(aula_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(aula)
}

pub async fn get_aula(db_pool: &SqlitePool, aula_id: i64) -> AppResult<Aula> {
    find_aula_by_id(db_pool, aula_id)
        .await?
        .ok_or_else(|| AppError::not_found("Aula não encontrada"))
}

/// Histórico de aulas, da mais recente para a mais antiga.
pub async fn list_aulas(db_pool: &SqlitePool, limite: i64) -> AppResult<Vec<Aula>> {
    let sql = format!("SELECT {AULA_COLUMNS} FROM aulas ORDER BY id DESC LIMIT ?1");
    let aulas = sqlx::query_as::<_, Aula>(&sql)
        .bind(limite.clamp(1, 500))
        .fetch_all(db_pool)
        .await?;
    Ok(aulas)
}

/// Abre uma nova aula, encerrando a que estiver aberta.
pub async fn iniciar_aula(
    db_pool: &SqlitePool,
    tema: &str,
    professores: &[String],
    iniciada_por: i64,
) -> AppResult<TransicaoAula> {
    let tema = tema.trim();
    let professores: Vec<&str> = professores
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if tema.is_empty() {
        return Err(AppError::validation("O tema da aula é obrigatório"));
    }
    if professores.is_empty() {
        return Err(AppError::validation("Informe pelo menos um professor"));
    }

    let agora = Utc::now();
    let mut tx = db_pool.begin().await?;

    // 1. Fecha a aula aberta (escrita primeiro, para pegar logo o lock de escrita)
    let fechar_sql = format!(
        "UPDATE aulas SET encerrada_em = ?1 WHERE encerrada_em IS NULL RETURNING {AULA_COLUMNS}"
    );
    let encerradas = sqlx::query_as::<_, Aula>(&fechar_sql)
        .bind(agora)
        .fetch_all(&mut *tx)
        .await?;

    // 2. Abre a nova
    let inserir_sql = format!(
        r#"
        INSERT INTO aulas (tema, professores, iniciada_em, encerrada_em, iniciada_por)
        VALUES (?1, ?2, ?3, NULL, ?4)
        RETURNING {AULA_COLUMNS}
        "#
    );
    let aula = match sqlx::query_as::<_, Aula>(&inserir_sql)
        .bind(tema)
        .bind(professores.join(", "))
        .bind(agora)
        .bind(iniciada_por)
        .fetch_one(&mut *tx)
        .await
    {
        Ok(aula) => aula,
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Outra aula foi aberta em simultâneo; desfazendo.");
            return Err(AppError::validation(
                "Outra aula foi iniciada ao mesmo tempo. Tente novamente.",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tx.commit().await?;

    let encerrada = encerradas.into_iter().next();
    if let Some(anterior) = &encerrada {
        tracing::info!(
            "📕 Aula {} ('{}') encerrada automaticamente ao iniciar a aula {}",
            anterior.id,
            anterior.tema,
            aula.id
        );
    }
    tracing::info!("📗 Aula {} iniciada: '{}' ({})", aula.id, aula.tema, aula.professores);

    Ok(TransicaoAula { aula, encerrada })
}

/// Encerra a aula indicada ou, sem ID, a aula ativa.
/// Encerrar uma aula já encerrada devolve-a sem alterações.
pub async fn encerrar_aula(db_pool: &SqlitePool, aula_id: Option<i64>) -> AppResult<Aula> {
    let agora = Utc::now();
    match aula_id {
        Some(id) => {
            let aula = get_aula(db_pool, id).await?;
            if !aula.esta_aberta() {
                tracing::debug!("Aula {} já estava encerrada.", id);
                return Ok(aula);
            }
            let sql = format!(
                "UPDATE aulas SET encerrada_em = ?1 WHERE id = ?2 AND encerrada_em IS NULL RETURNING {AULA_COLUMNS}"
            );
            let fechada = sqlx::query_as::<_, Aula>(&sql)
                .bind(agora)
                .bind(id)
                .fetch_optional(db_pool)
                .await?;
            let aula = match fechada {
                Some(a) => a,
                // Fechada por outro pedido entre a leitura e o UPDATE
                None => get_aula(db_pool, id).await?,
            };
            tracing::info!("📕 Aula {} encerrada.", aula.id);
            Ok(aula)
        }
        None => {
            let sql = format!(
                "UPDATE aulas SET encerrada_em = ?1 WHERE encerrada_em IS NULL RETURNING {AULA_COLUMNS}"
            );
            let fechada = sqlx::query_as::<_, Aula>(&sql)
                .bind(agora)
                .fetch_optional(db_pool)
                .await?
                .ok_or_else(|| AppError::not_found("Nenhuma aula ativa"))?;
            tracing::info!("📕 Aula {} encerrada.", fechada.id);
            Ok(fechada)
        }
    }
}

/// Marca a entrada (check-in) de um aluno. Idempotente: a hora da primeira
/// entrada nunca é reescrita.
pub async fn marcar_entrada(
    db_pool: &SqlitePool,
    aula_id: Option<i64>,
    aluno_id: i64,
) -> AppResult<Frequencia> {
    let aula = match aula_id {
        Some(id) => get_aula(db_pool, id).await?,
        None => get_aula_ativa(db_pool)
            .await?
            .ok_or_else(|| AppError::not_found("Nenhuma aula ativa"))?,
    };
    if !aula.esta_aberta() {
        return Err(AppError::validation("A aula já foi encerrada"));
    }
    let aluno = aluno_service::get_aluno(db_pool, aluno_id).await?;

    let agora = Utc::now();
    tracing::debug!("Marcando ENTRADA de {} na aula {} em {}", aluno.nome, aula.id, agora);

    let sql = format!(
        r#"
        INSERT INTO frequencia (aula_id, aluno_id, entrada)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(aula_id, aluno_id) DO UPDATE SET
           entrada = COALESCE(frequencia.entrada, excluded.entrada)
        RETURNING {FREQUENCIA_COLUMNS}
        "#
    );
    let frequencia = sqlx::query_as::<_, Frequencia>(&sql)
        .bind(aula.id)
        .bind(aluno.id)
        .bind(agora)
        .fetch_one(db_pool)
        .await?;

    Ok(frequencia)
}

/// Marca a saída (check-out) de um aluno, validando quem o retira.
///
/// Se o aluno tem autorizados registados, `retirado_por` tem de coincidir com um
/// deles. Um admin pode passar por cima com `forcar`, o que fica registado em
/// `liberado_por_admin`. Sem entrada prévia, a linha é criada com entrada igual
/// à saída e `entrada_inferida = 1`.
pub async fn marcar_saida(
    db_pool: &SqlitePool,
    referencia: RefFrequencia,
    retirado_por: &str,
    operador: &Principal,
    forcar: bool,
) -> AppResult<Frequencia> {
    let retirado_por = retirado_por.trim();
    if retirado_por.is_empty() {
        return Err(AppError::validation("Informe quem está a retirar a criança"));
    }

    let (aula_id, aluno_id) = match referencia {
        RefFrequencia::Id(id) => {
            let par: Option<(i64, i64)> =
                sqlx::query_as("SELECT aula_id, aluno_id FROM frequencia WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(db_pool)
                    .await?;
            par.ok_or_else(|| AppError::not_found("Registo de frequência não encontrado"))?
        }
        RefFrequencia::Par { aula_id, aluno_id } => (aula_id, aluno_id),
    };

    let aula = get_aula(db_pool, aula_id).await?;
    let aluno = aluno_service::get_aluno(db_pool, aluno_id).await?;

    let liberado_por_admin = if aluno.pode_ser_retirado_por(retirado_por) {
        false
    } else if forcar && operador.is_admin() {
        tracing::warn!(
            "⚠️ Admin {} liberou a saída de {} para '{}' (não autorizado)",
            operador.usuario,
            aluno.nome,
            retirado_por
        );
        true
    } else {
        tracing::warn!(
            "🚫 Saída recusada: '{}' não está autorizado a retirar {} (operador {})",
            retirado_por,
            aluno.nome,
            operador.usuario
        );
        return Err(AppError::forbidden(format!(
            "{retirado_por} não está autorizado(a) a retirar {}",
            aluno.nome
        )));
    };

    let agora = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO frequencia
            (aula_id, aluno_id, entrada, saida, retirado_por, entrada_inferida, liberado_por_admin)
        VALUES (?1, ?2, ?3, ?3, ?4, 1, ?5)
        ON CONFLICT(aula_id, aluno_id) DO UPDATE SET
           entrada_inferida = CASE WHEN frequencia.entrada IS NULL THEN 1
                                   ELSE frequencia.entrada_inferida END,
           entrada = COALESCE(frequencia.entrada, excluded.entrada),
           saida = excluded.saida,
           retirado_por = excluded.retirado_por,
           liberado_por_admin = excluded.liberado_por_admin
        RETURNING {FREQUENCIA_COLUMNS}
        "#
    );
    let frequencia = sqlx::query_as::<_, Frequencia>(&sql)
        .bind(aula.id)
        .bind(aluno.id)
        .bind(agora)
        .bind(retirado_por)
        .bind(liberado_por_admin)
        .fetch_one(db_pool)
        .await?;

    if frequencia.entrada_inferida {
        tracing::warn!(
            "Saída de {} na aula {} sem entrada registada; entrada preenchida com a hora da saída.",
            aluno.nome,
            aula.id
        );
    }
    tracing::info!("👋 {} retirado(a) por {} (aula {})", aluno.nome, retirado_por, aula.id);

    Ok(frequencia)
}

/// Lista de presença de uma aula com os nomes dos alunos.
pub async fn list_frequencia(db_pool: &SqlitePool, aula_id: i64) -> AppResult<Vec<FrequenciaAluno>> {
    let linhas = sqlx::query_as::<_, FrequenciaAluno>(
        r#"
        SELECT f.id, f.aula_id, f.aluno_id,
               a.nome AS aluno_nome, a.responsavel,
               f.entrada, f.saida, f.retirado_por,
               f.entrada_inferida, f.liberado_por_admin
        FROM frequencia f
        JOIN alunos a ON a.id = f.aluno_id
        WHERE f.aula_id = ?1
        ORDER BY a.nome ASC, f.id ASC
        "#,
    )
    .bind(aula_id)
    .fetch_all(db_pool)
    .await?;
    Ok(linhas)
}
