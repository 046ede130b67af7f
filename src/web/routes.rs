// src/web/routes.rs
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    web::{
        aluno_handlers, auth_handlers, aula_handlers, aviso_handlers, mw_admin, mw_auth, relatorio_handlers,
        usuario_handlers,
    },
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", post(auth_handlers::handle_login))
        .route("/health", get(auth_handlers::handle_health));

    // --- Rotas de Admin ---
    // Exigem login E role admin. Os GET dos mesmos caminhos ficam abertos a toda a equipa.
    let admin_routes = Router::new()
        .route("/usuarios", post(usuario_handlers::create_usuario))
        .route(
            "/usuarios/{id}",
            put(usuario_handlers::update_usuario).delete(usuario_handlers::delete_usuario),
        )
        .route("/avisos/{id}", delete(aviso_handlers::delete_aviso))
        .route("/avisos/{id}/fixar", post(aviso_handlers::fixar_aviso))
        // Aplica APENAS mw_admin aqui (mw_auth é aplicado no router pai)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_admin::require_admin,
        ));

    let aula_routes = Router::new()
        .route("/", get(aula_handlers::list_aulas))
        .route("/ativa", get(aula_handlers::get_aula_ativa))
        .route("/iniciar", post(aula_handlers::iniciar_aula))
        .route("/encerrar", post(aula_handlers::encerrar_aula))
        .route("/entrada", post(aula_handlers::marcar_entrada))
        .route("/saida", post(aula_handlers::marcar_saida))
        .route("/{id}/presenca", get(aula_handlers::list_presenca))
        .route("/{id}/relatorio", get(relatorio_handlers::relatorio_json))
        .route("/{id}/relatorio.csv", get(relatorio_handlers::relatorio_csv))
        .route("/{id}/relatorio.html", get(relatorio_handlers::relatorio_html));

    // --- Rotas Autenticadas ---
    // Exigem *pelo menos* login
    let authenticated_routes = Router::new()
        .route("/me", get(auth_handlers::handle_me))
        .route("/me/senha", put(auth_handlers::handle_alterar_senha))
        .route(
            "/alunos",
            get(aluno_handlers::list_alunos).post(aluno_handlers::create_aluno),
        )
        .route(
            "/alunos/{id}",
            get(aluno_handlers::get_aluno)
                .put(aluno_handlers::update_aluno)
                .delete(aluno_handlers::delete_aluno),
        )
        .route("/usuarios", get(usuario_handlers::list_usuarios))
        .route("/equipe", get(usuario_handlers::list_usuarios))
        .route(
            "/avisos",
            get(aviso_handlers::list_avisos).post(aviso_handlers::create_aviso),
        )
        .route("/avisos/{id}/like", post(aviso_handlers::toggle_like))
        .route(
            "/avisos/{id}/comentarios",
            get(aviso_handlers::list_comentarios).post(aviso_handlers::add_comentario),
        )
        .route("/comentarios/{id}", delete(aviso_handlers::delete_comentario))
        .nest("/aulas", aula_routes)
        // Junta os métodos admin aos mesmos caminhos (ex.: GET /usuarios + POST /usuarios)
        .merge(admin_routes)
        // Aplica require_auth a TODAS as rotas definidas acima (incluindo as de admin)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router Final ---
    let api = Router::new().merge(public_routes).merge(authenticated_routes);

    Router::new().nest("/api", api).with_state(app_state)
}

/// CORS: só a origem configurada, ou permissivo quando nenhuma é indicada.
pub fn cors_layer(cors_origin: Option<&str>) -> AppResult<CorsLayer> {
    let Some(origin) = cors_origin else {
        return Ok(CorsLayer::permissive());
    };

    let origin = HeaderValue::from_str(origin)
        .map_err(|e| AppError::Config(format!("CORS_ORIGIN inválida '{origin}': {e}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}
