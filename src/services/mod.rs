// src/services/mod.rs
pub mod aluno_service;
pub mod auth_service;
pub mod aula_service;
pub mod aviso_service;
pub mod relatorio_service;
pub mod token_service;
pub mod usuario_service;

/// Apara um campo de texto opcional; vazio passa a `None` (NULL na DB).
pub(crate) fn texto_opcional(valor: Option<String>) -> Option<String> {
    valor.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
