// src/services/aluno_service.rs
use crate::{
    error::{AppError, AppResult},
    models::aluno::{Aluno, AlunoPayload},
    services::texto_opcional,
};
use chrono::Utc;
use sqlx::SqlitePool;

const ALUNO_COLUMNS: &str = r#"
    id, nome, data_nascimento, responsavel, telefone, observacoes,
    autorizado_retirar, autorizado_2, autorizado_3, foto, ativo, criado_em
"#;

/// Lista os alunos ativos, opcionalmente filtrando pelo nome.
pub async fn list_alunos(db_pool: &SqlitePool, busca: Option<&str>) -> AppResult<Vec<Aluno>> {
    let busca = busca.map(str::trim).filter(|b| !b.is_empty());
    let alunos = match busca {
        Some(termo) => {
            tracing::debug!("Buscando alunos com nome contendo '{}'", termo);
            let sql = format!(
                "SELECT {ALUNO_COLUMNS} FROM alunos WHERE ativo = 1 AND nome LIKE ?1 ORDER BY nome ASC"
            );
            sqlx::query_as::<_, Aluno>(&sql)
                .bind(format!("%{termo}%"))
                .fetch_all(db_pool)
                .await?
        }
        None => {
            let sql = format!("SELECT {ALUNO_COLUMNS} FROM alunos WHERE ativo = 1 ORDER BY nome ASC");
            sqlx::query_as::<_, Aluno>(&sql).fetch_all(db_pool).await?
        }
    };
    Ok(alunos)
}

/// Busca um aluno ativo pelo ID.
pub async fn find_aluno_by_id(db_pool: &SqlitePool, aluno_id: i64) -> AppResult<Option<Aluno>> {
    let sql = format!("SELECT {ALUNO_COLUMNS} FROM alunos WHERE id = ?1 AND ativo = 1");
    let aluno = sqlx::query_as::<_, Aluno>(&sql)
        .bind(aluno_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(aluno)
}

pub async fn get_aluno(db_pool: &SqlitePool, aluno_id: i64) -> AppResult<Aluno> {
    find_aluno_by_id(db_pool, aluno_id)
        .await?
        .ok_or_else(|| AppError::not_found("Aluno não encontrado"))
}

/// Registo normalizado a partir do payload (nome obrigatório, vazios viram NULL).
struct DadosAluno {
    nome: String,
    data_nascimento: Option<String>,
    responsavel: Option<String>,
    telefone: Option<String>,
    observacoes: Option<String>,
    autorizado_retirar: Option<String>,
    autorizado_2: Option<String>,
    autorizado_3: Option<String>,
    foto: Option<String>,
}

impl TryFrom<AlunoPayload> for DadosAluno {
    type Error = AppError;

    fn try_from(p: AlunoPayload) -> Result<Self, Self::Error> {
        let nome = p.nome.trim().to_string();
        if nome.is_empty() {
            return Err(AppError::validation("O nome do aluno é obrigatório"));
        }
        Ok(Self {
            nome,
            data_nascimento: texto_opcional(p.data_nascimento),
            responsavel: texto_opcional(p.responsavel),
            telefone: texto_opcional(p.telefone),
            observacoes: texto_opcional(p.observacoes),
            autorizado_retirar: texto_opcional(p.autorizado_retirar),
            autorizado_2: texto_opcional(p.autorizado_2),
            autorizado_3: texto_opcional(p.autorizado_3),
            foto: texto_opcional(p.foto),
        })
    }
}

pub async fn create_aluno(db_pool: &SqlitePool, payload: AlunoPayload) -> AppResult<Aluno> {
    let d = DadosAluno::try_from(payload)?;

    let id = sqlx::query(
        r#"
        INSERT INTO alunos (
            nome, data_nascimento, responsavel, telefone, observacoes,
            autorizado_retirar, autorizado_2, autorizado_3, foto, ativo, criado_em
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)
        "#,
    )
    .bind(&d.nome)
    .bind(&d.data_nascimento)
    .bind(&d.responsavel)
    .bind(&d.telefone)
    .bind(&d.observacoes)
    .bind(&d.autorizado_retirar)
    .bind(&d.autorizado_2)
    .bind(&d.autorizado_3)
    .bind(&d.foto)
    .bind(Utc::now())
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!("✅ Aluno '{}' registado (id {}).", d.nome, id);
    get_aluno(db_pool, id).await
}

pub async fn update_aluno(db_pool: &SqlitePool, aluno_id: i64, payload: AlunoPayload) -> AppResult<Aluno> {
    let d = DadosAluno::try_from(payload)?;

    let rows_affected = sqlx::query(
        r#"
        UPDATE alunos
        SET nome = ?1,
            data_nascimento = ?2,
            responsavel = ?3,
            telefone = ?4,
            observacoes = ?5,
            autorizado_retirar = ?6,
            autorizado_2 = ?7,
            autorizado_3 = ?8,
            foto = ?9
        WHERE id = ?10 AND ativo = 1
        "#,
    )
    .bind(&d.nome)
    .bind(&d.data_nascimento)
    .bind(&d.responsavel)
    .bind(&d.telefone)
    .bind(&d.observacoes)
    .bind(&d.autorizado_retirar)
    .bind(&d.autorizado_2)
    .bind(&d.autorizado_3)
    .bind(&d.foto)
    .bind(aluno_id)
    .execute(db_pool)
    .await?
    .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao atualizar aluno {}: não encontrado.", aluno_id);
        return Err(AppError::not_found("Aluno não encontrado"));
    }
    tracing::info!("✅ Aluno {} atualizado.", aluno_id);
    get_aluno(db_pool, aluno_id).await
}

/// Soft delete: o histórico de frequência continua a apontar para o aluno.
pub async fn delete_aluno(db_pool: &SqlitePool, aluno_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("UPDATE alunos SET ativo = 0 WHERE id = ?1 AND ativo = 1")
        .bind(aluno_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        return Err(AppError::not_found("Aluno não encontrado"));
    }
    tracing::info!("🗑️ Aluno {} removido.", aluno_id);
    Ok(())
}
