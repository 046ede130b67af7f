// src/services/usuario_service.rs
use crate::{
    config::AdminBootstrap,
    error::{is_unique_violation, AppError, AppResult},
    models::usuario::{AtualizarUsuario, NovoUsuario, Role, Usuario},
    services::{auth_service, texto_opcional},
};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

const USUARIO_COLUMNS: &str = "id, nome, usuario, senha_hash, role, foto, ativo, criado_em";

/// Busca um utilizador pelo ID (ativo ou não).
pub async fn find_usuario_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<Usuario>> {
    tracing::debug!("Buscando utilizador por ID: {}", user_id);
    let sql = format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE id = ?1");
    let user = sqlx::query_as::<_, Usuario>(&sql)
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Busca um utilizador ativo pelo login.
pub async fn find_usuario_by_login(db_pool: &SqlitePool, usuario: &str) -> AppResult<Option<Usuario>> {
    let sql = format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE usuario = ?1 AND ativo = 1");
    let user = sqlx::query_as::<_, Usuario>(&sql)
        .bind(usuario)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Lista a equipe ativa por nome.
pub async fn find_all_usuarios(db_pool: &SqlitePool) -> AppResult<Vec<Usuario>> {
    let sql = format!("SELECT {USUARIO_COLUMNS} FROM usuarios WHERE ativo = 1 ORDER BY nome ASC, id ASC");
    let users = sqlx::query_as::<_, Usuario>(&sql).fetch_all(db_pool).await?;
    tracing::debug!("Encontrados {} utilizadores.", users.len());
    Ok(users)
}

async fn count_admins_ativos(conn: &mut SqliteConnection) -> AppResult<i64> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM usuarios WHERE role = 'admin' AND ativo = 1")
            .fetch_one(conn)
            .await?;
    Ok(total)
}

/// Cria um membro da equipe (só admin, verificado no router).
pub async fn create_usuario(db_pool: &SqlitePool, novo: NovoUsuario) -> AppResult<Usuario> {
    let nome = novo.nome.trim();
    let login = novo.usuario.trim();
    if nome.is_empty() || login.is_empty() || novo.senha.is_empty() {
        return Err(AppError::validation("Nome, usuário e senha são obrigatórios"));
    }
    let role = novo.role.unwrap_or(Role::Auxiliar);
    tracing::info!("Tentando criar utilizador: {} ({})", login, role);

    let senha_hash = auth_service::hash_password(&novo.senha).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO usuarios (nome, usuario, senha_hash, role, foto, ativo, criado_em)
        VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
        "#,
    )
    .bind(nome)
    .bind(login)
    .bind(&senha_hash)
    .bind(role)
    .bind(texto_opcional(novo.foto))
    .bind(Utc::now())
    .execute(db_pool)
    .await;

    let id = match result {
        Ok(r) => r.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Falha ao criar user: login '{}' já existe.", login);
            return Err(AppError::validation(format!("O usuário '{login}' já existe")));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("✅ Utilizador '{}' criado com sucesso (id {}).", login, id);
    find_usuario_by_id(db_pool, id)
        .await?
        .ok_or(AppError::InternalServerError)
}

/// Atualiza dados de um membro da equipe. Não deixa despromover o último admin.
pub async fn update_usuario(
    db_pool: &SqlitePool,
    user_id: i64,
    dados: AtualizarUsuario,
) -> AppResult<Usuario> {
    let nome = dados.nome.trim();
    let login = dados.usuario.trim();
    if nome.is_empty() || login.is_empty() {
        return Err(AppError::validation("Nome e usuário são obrigatórios"));
    }

    // Hash fora da transação: o bcrypt é lento e não deve segurar o lock de escrita
    let nova_senha_hash = match dados.senha.as_deref().filter(|s| !s.is_empty()) {
        Some(senha) => Some(auth_service::hash_password(senha).await?),
        None => None,
    };

    // Escreve primeiro (lock de escrita logo no início) e só depois verifica
    // se ainda sobra um admin; se não sobrar, a transação é desfeita.
    let mut tx = db_pool.begin().await?;

    let sql = format!(
        r#"
        UPDATE usuarios
        SET nome = ?1,
            usuario = ?2,
            role = COALESCE(?3, role),
            foto = ?4,
            senha_hash = COALESCE(?5, senha_hash)
        WHERE id = ?6 AND ativo = 1
        RETURNING {USUARIO_COLUMNS}
        "#
    );
    let result = sqlx::query_as::<_, Usuario>(&sql)
        .bind(nome)
        .bind(login)
        .bind(dados.role)
        .bind(texto_opcional(dados.foto))
        .bind(nova_senha_hash)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await;

    let atualizado = match result {
        Ok(Some(u)) => u,
        Ok(None) => return Err(AppError::not_found("Usuário não encontrado")),
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::validation(format!("O usuário '{login}' já existe")));
        }
        Err(e) => return Err(e.into()),
    };

    if !atualizado.role.is_admin() && count_admins_ativos(&mut *tx).await? == 0 {
        tracing::warn!("Tentativa de despromover o último admin ({})", user_id);
        return Err(AppError::validation("Não é possível remover o último administrador"));
    }

    tx.commit().await?;
    tracing::info!("✅ Dados atualizados com sucesso para user: {}", user_id);
    Ok(atualizado)
}

/// Altera a senha de um utilizador (sem verificar a antiga).
pub async fn update_usuario_password(
    db_pool: &SqlitePool,
    user_id: i64,
    new_raw_password: &str,
) -> AppResult<()> {
    tracing::info!("Tentando alterar senha para user: {}", user_id);
    let new_password_hash = auth_service::hash_password(new_raw_password).await?;

    let rows_affected = sqlx::query("UPDATE usuarios SET senha_hash = ?1 WHERE id = ?2 AND ativo = 1")
        .bind(new_password_hash)
        .bind(user_id)
        .execute(db_pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Falha ao alterar senha: Utilizador '{}' não encontrado.", user_id);
        Err(AppError::not_found("Usuário não encontrado"))
    } else {
        tracing::info!("✅ Senha alterada com sucesso para user: {}", user_id);
        Ok(())
    }
}

/// Remove (soft delete) um membro da equipe.
///
/// Recusa apagar o próprio utilizador e o último admin ativo.
pub async fn delete_usuario(db_pool: &SqlitePool, user_id: i64, solicitante_id: i64) -> AppResult<()> {
    if user_id == solicitante_id {
        return Err(AppError::validation("Você não pode excluir o próprio usuário"));
    }

    // Escreve primeiro: o UPDATE pega logo o lock de escrita, e a contagem
    // de admins abaixo já vê o estado que vai ser gravado.
    let mut tx = db_pool.begin().await?;

    let role: Option<Role> =
        sqlx::query_scalar("UPDATE usuarios SET ativo = 0 WHERE id = ?1 AND ativo = 1 RETURNING role")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    let role = role.ok_or_else(|| AppError::not_found("Usuário não encontrado"))?;

    if role.is_admin() && count_admins_ativos(&mut *tx).await? == 0 {
        // tx é descartada sem commit: rollback
        tracing::warn!("Tentativa de remover o último admin ({})", user_id);
        return Err(AppError::validation("Não é possível excluir o último administrador"));
    }

    tx.commit().await?;
    tracing::info!("🗑️ Utilizador {} removido por {}", user_id, solicitante_id);
    Ok(())
}

/// Garante que existe pelo menos um admin ativo, criando o da configuração se preciso.
pub async fn ensure_admin(db_pool: &SqlitePool, admin: &AdminBootstrap) -> AppResult<()> {
    let mut conn = db_pool.acquire().await?;
    if count_admins_ativos(&mut *conn).await? > 0 {
        return Ok(());
    }
    drop(conn);

    if admin.senha == crate::config::DEFAULT_ADMIN_SENHA {
        tracing::warn!("⚠️ Criando admin '{}' com a senha padrão. Altere-a após o primeiro login!", admin.usuario);
    }
    create_usuario(
        db_pool,
        NovoUsuario {
            nome: admin.nome.clone(),
            usuario: admin.usuario.clone(),
            senha: admin.senha.clone(),
            role: Some(Role::Admin),
            foto: None,
        },
    )
    .await?;
    Ok(())
}
