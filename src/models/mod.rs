pub mod aluno;
pub mod aula;
pub mod aviso;
pub mod relatorio;
pub mod usuario;
