// src/services/aviso_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        aviso::{Aviso, Comentario, EstadoLike, NovoAviso},
        usuario::Principal,
    },
    services::texto_opcional,
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

// Colunas do aviso + contadores; ?1 é o utilizador que está a ver o mural
const AVISO_SELECT: &str = r#"
    SELECT av.id, av.mensagem, av.imagem, av.autor_id, av.autor_nome, av.fixado, av.criado_em,
           (SELECT COUNT(*) FROM avisos_likes l WHERE l.aviso_id = av.id) AS likes,
           (SELECT COUNT(*) FROM avisos_comentarios c WHERE c.aviso_id = av.id) AS comentarios,
           EXISTS (SELECT 1 FROM avisos_likes l
                   WHERE l.aviso_id = av.id AND l.usuario_id = ?1) AS curtido
    FROM avisos av
"#;

/// Mural: fixados primeiro, depois os mais recentes.
pub async fn list_avisos(db_pool: &SqlitePool, viewer_id: i64) -> AppResult<Vec<Aviso>> {
    let sql = format!("{AVISO_SELECT} ORDER BY av.fixado DESC, av.criado_em DESC, av.id DESC");
    let avisos = sqlx::query_as::<_, Aviso>(&sql)
        .bind(viewer_id)
        .fetch_all(db_pool)
        .await?;
    Ok(avisos)
}

pub async fn get_aviso(db_pool: &SqlitePool, aviso_id: i64, viewer_id: i64) -> AppResult<Aviso> {
    let sql = format!("{AVISO_SELECT} WHERE av.id = ?2");
    sqlx::query_as::<_, Aviso>(&sql)
        .bind(viewer_id)
        .bind(aviso_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Aviso não encontrado"))
}

async fn aviso_existe(conn: &mut SqliteConnection, aviso_id: i64) -> AppResult<bool> {
    let existe: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM avisos WHERE id = ?1)")
        .bind(aviso_id)
        .fetch_one(conn)
        .await?;
    Ok(existe)
}

/// Publica um aviso. Precisa de mensagem ou imagem.
pub async fn create_aviso(db_pool: &SqlitePool, autor: &Principal, novo: NovoAviso) -> AppResult<Aviso> {
    let mensagem = texto_opcional(novo.mensagem);
    let imagem = texto_opcional(novo.imagem);
    if mensagem.is_none() && imagem.is_none() {
        return Err(AppError::validation("O aviso precisa de uma mensagem ou imagem"));
    }

    let id = sqlx::query(
        r#"
        INSERT INTO avisos (mensagem, imagem, autor_id, autor_nome, fixado, criado_em)
        VALUES (?1, ?2, ?3, ?4, 0, ?5)
        "#,
    )
    .bind(mensagem)
    .bind(imagem)
    .bind(autor.id)
    .bind(&autor.nome)
    .bind(Utc::now())
    .execute(db_pool)
    .await?
    .last_insert_rowid();

    tracing::info!("📌 Aviso {} publicado por {}", id, autor.usuario);
    get_aviso(db_pool, id, autor.id).await
}

/// Fixa ou desafixa um aviso no topo do mural.
pub async fn set_fixado(db_pool: &SqlitePool, aviso_id: i64, fixado: bool) -> AppResult<()> {
    let rows_affected = sqlx::query("UPDATE avisos SET fixado = ?1 WHERE id = ?2")
        .bind(fixado)
        .bind(aviso_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::not_found("Aviso não encontrado"));
    }
    tracing::debug!("Aviso {} fixado = {}", aviso_id, fixado);
    Ok(())
}

/// Apaga o aviso (likes e comentários vão em cascata).
pub async fn delete_aviso(db_pool: &SqlitePool, aviso_id: i64) -> AppResult<()> {
    let rows_affected = sqlx::query("DELETE FROM avisos WHERE id = ?1")
        .bind(aviso_id)
        .execute(db_pool)
        .await?
        .rows_affected();
    if rows_affected == 0 {
        return Err(AppError::not_found("Aviso não encontrado"));
    }
    tracing::info!("🗑️ Aviso {} apagado.", aviso_id);
    Ok(())
}

/// Alterna o like do utilizador e devolve o novo estado.
pub async fn toggle_like(db_pool: &SqlitePool, aviso_id: i64, usuario_id: i64) -> AppResult<EstadoLike> {
    let mut tx = db_pool.begin().await?;

    // Tenta remover primeiro: se havia like, isto já é o toggle (e pega o lock de escrita)
    let removidos = sqlx::query("DELETE FROM avisos_likes WHERE aviso_id = ?1 AND usuario_id = ?2")
        .bind(aviso_id)
        .bind(usuario_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let curtido = if removidos > 0 {
        false
    } else {
        if !aviso_existe(&mut *tx, aviso_id).await? {
            return Err(AppError::not_found("Aviso não encontrado"));
        }
        sqlx::query("INSERT INTO avisos_likes (aviso_id, usuario_id) VALUES (?1, ?2)")
            .bind(aviso_id)
            .bind(usuario_id)
            .execute(&mut *tx)
            .await?;
        true
    };

    let likes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM avisos_likes WHERE aviso_id = ?1")
        .bind(aviso_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(EstadoLike { curtido, likes })
}

pub async fn list_comentarios(db_pool: &SqlitePool, aviso_id: i64) -> AppResult<Vec<Comentario>> {
    let mut conn = db_pool.acquire().await?;
    if !aviso_existe(&mut *conn, aviso_id).await? {
        return Err(AppError::not_found("Aviso não encontrado"));
    }
    let comentarios = sqlx::query_as::<_, Comentario>(
        r#"
        SELECT c.id, c.aviso_id, c.usuario_id, u.nome AS usuario_nome, c.texto, c.criado_em
        FROM avisos_comentarios c
        JOIN usuarios u ON u.id = c.usuario_id
        WHERE c.aviso_id = ?1
        ORDER BY c.criado_em ASC, c.id ASC
        "#,
    )
    .bind(aviso_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(comentarios)
}

pub async fn add_comentario(
    db_pool: &SqlitePool,
    aviso_id: i64,
    autor: &Principal,
    texto: &str,
) -> AppResult<Comentario> {
    let texto = texto.trim();
    if texto.is_empty() {
        return Err(AppError::validation("O comentário não pode ser vazio"));
    }

    let mut conn = db_pool.acquire().await?;
    if !aviso_existe(&mut *conn, aviso_id).await? {
        return Err(AppError::not_found("Aviso não encontrado"));
    }

    let agora = Utc::now();
    let id = sqlx::query(
        "INSERT INTO avisos_comentarios (aviso_id, usuario_id, texto, criado_em) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(aviso_id)
    .bind(autor.id)
    .bind(texto)
    .bind(agora)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(Comentario {
        id,
        aviso_id,
        usuario_id: autor.id,
        usuario_nome: autor.nome.clone(),
        texto: texto.to_string(),
        criado_em: agora,
    })
}

/// Apaga um comentário; só o autor ou um admin.
pub async fn delete_comentario(db_pool: &SqlitePool, comentario_id: i64, solicitante: &Principal) -> AppResult<()> {
    let autor_id: Option<i64> =
        sqlx::query_scalar("SELECT usuario_id FROM avisos_comentarios WHERE id = ?1")
            .bind(comentario_id)
            .fetch_optional(db_pool)
            .await?;
    let autor_id = autor_id.ok_or_else(|| AppError::not_found("Comentário não encontrado"))?;

    if autor_id != solicitante.id && !solicitante.is_admin() {
        tracing::warn!("{} tentou apagar comentário {} de outro utilizador", solicitante.usuario, comentario_id);
        return Err(AppError::forbidden("Só o autor ou um admin pode apagar este comentário"));
    }

    sqlx::query("DELETE FROM avisos_comentarios WHERE id = ?1")
        .bind(comentario_id)
        .execute(db_pool)
        .await?;
    Ok(())
}
