use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use ieq_central::{
    config::AdminBootstrap,
    db,
    models::usuario::{NovoUsuario, Principal, Role},
    services::{
        token_service::{JwtSigner, TokenSigner},
        usuario_service,
    },
    state::AppState,
    web::routes::create_router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &[u8] = b"segredo-de-teste-com-pelo-menos-32-bytes";

struct TestApp {
    router: Router,
    pool: sqlx::SqlitePool,
    signer: Arc<JwtSigner>,
    _tempdir: tempfile::TempDir,
}

impl TestApp {
    async fn spawn() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = db::create_db_pool(&format!("sqlite://{}", db_path.display()))
            .await
            .unwrap();
        usuario_service::ensure_admin(
            &pool,
            &AdminBootstrap {
                usuario: "admin".into(),
                senha: "1234".into(),
                nome: "Administrador".into(),
            },
        )
        .await
        .unwrap();

        let signer = Arc::new(JwtSigner::new(SECRET, chrono::Duration::days(30)));
        let state = AppState::new(pool.clone(), signer.clone());
        Self {
            router: create_router(state),
            pool,
            signer,
            _tempdir: dir,
        }
    }

    /// Token para um utilizador existente, sem passar pelo bcrypt do login.
    async fn token_for(&self, login: &str) -> String {
        let user = usuario_service::find_usuario_by_login(&self.pool, login)
            .await
            .unwrap()
            .expect("utilizador inexistente");
        self.signer.issue(&Principal::from(&user)).unwrap()
    }

    async fn create_staff(&self, login: &str, nome: &str, role: Role) -> String {
        usuario_service::create_usuario(
            &self.pool,
            NovoUsuario {
                nome: nome.into(),
                usuario: login.into(),
                senha: "senha".into(),
                role: Some(role),
                foto: None,
            },
        )
        .await
        .unwrap();
        self.token_for(login).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec(), content_type)
    }

    async fn request(&self, method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, bytes, _) = self.send(request).await;
        let value: Value = if bytes.is_empty() {
            json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, value)
    }

    async fn expect(&self, method: &str, path: &str, token: &str, body: Option<Value>, status: StatusCode) -> Value {
        let (got, value) = self.request(method, path, Some(token), body).await;
        assert_eq!(got, status, "{method} {path} -> {value}");
        value
    }

    async fn create_aluno(&self, token: &str, body: Value) -> i64 {
        let v = self.expect("POST", "/api/alunos", token, Some(body), StatusCode::CREATED).await;
        v["data"]["id"].as_i64().unwrap()
    }

    async fn iniciar(&self, token: &str, tema: &str) -> Value {
        self.expect(
            "POST",
            "/api/aulas/iniciar",
            token,
            Some(json!({"tema": tema, "professores": ["Tia Carla"]})),
            StatusCode::CREATED,
        )
        .await
    }
}

#[tokio::test]
async fn login_returns_token_usable_on_protected_routes() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request("POST", "/api/login", None, Some(json!({"usuario": "admin", "senha": "1234"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["user"]["role"], json!("admin"));
    assert!(body["data"]["user"].get("senha_hash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let me = app.expect("GET", "/api/me", &token, None, StatusCode::OK).await;
    assert_eq!(me["data"]["usuario"], json!("admin"));

    let (status, body) = app
        .request("POST", "/api/login", None, Some(json!({"usuario": "admin", "senha": "errada"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].is_string());

    let (status, _) = app.request("GET", "/api/alunos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.request("GET", "/api/alunos", Some("lixo"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::spawn().await;
    let user = usuario_service::find_usuario_by_login(&app.pool, "admin")
        .await
        .unwrap()
        .unwrap();
    let expired = JwtSigner::new(SECRET, chrono::Duration::days(-1))
        .issue(&Principal::from(&user))
        .unwrap();

    let (status, body) = app.request("GET", "/api/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Token expirado"));
}

#[tokio::test]
async fn starting_a_session_closes_the_open_one() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin").await;

    let ativa = app.expect("GET", "/api/aulas/ativa", &admin, None, StatusCode::OK).await;
    assert_eq!(ativa["data"], json!(null));

    let primeira = app.iniciar(&admin, "Arca de Noé").await;
    let primeira_id = primeira["data"]["aula"]["id"].as_i64().unwrap();
    assert_eq!(primeira["data"]["encerrada"], json!(null));

    let segunda = app.iniciar(&admin, "Davi e Golias").await;
    let segunda_id = segunda["data"]["aula"]["id"].as_i64().unwrap();
    assert_eq!(segunda["data"]["encerrada"]["id"].as_i64(), Some(primeira_id));
    assert_eq!(
        segunda["data"]["encerrada"]["encerrada_em"],
        segunda["data"]["aula"]["iniciada_em"]
    );

    let abertas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aulas WHERE encerrada_em IS NULL")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(abertas, 1);

    let ativa = app.expect("GET", "/api/aulas/ativa", &admin, None, StatusCode::OK).await;
    assert_eq!(ativa["data"]["id"].as_i64(), Some(segunda_id));

    // Sem corpo: encerra a ativa
    let fechada = app.expect("POST", "/api/aulas/encerrar", &admin, None, StatusCode::OK).await;
    assert_eq!(fechada["data"]["id"].as_i64(), Some(segunda_id));
    assert!(fechada["data"]["encerrada_em"].is_string());

    app.expect("POST", "/api/aulas/encerrar", &admin, None, StatusCode::NOT_FOUND).await;

    // Encerrar de novo pelo ID não altera nada
    let de_novo = app
        .expect(
            "POST",
            "/api/aulas/encerrar",
            &admin,
            Some(json!({"aula_id": segunda_id})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(de_novo["data"]["encerrada_em"], fechada["data"]["encerrada_em"]);

    let (status, _) = app
        .request(
            "POST",
            "/api/aulas/iniciar",
            Some(&admin),
            Some(json!({"tema": "  ", "professores": ["Tia Carla"]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn check_in_is_idempotent() {
    let app = TestApp::spawn().await;
    let token = app.create_staff("carla", "Tia Carla", Role::Professor).await;
    let aluno = app.create_aluno(&token, json!({"nome": "Pedro"})).await;

    app.expect(
        "POST",
        "/api/aulas/entrada",
        &token,
        Some(json!({"aluno_id": aluno})),
        StatusCode::NOT_FOUND,
    )
    .await;

    app.iniciar(&token, "Jonas").await;
    let primeira = app
        .expect("POST", "/api/aulas/entrada", &token, Some(json!({"aluno_id": aluno})), StatusCode::OK)
        .await;
    let segunda = app
        .expect("POST", "/api/aulas/entrada", &token, Some(json!({"aluno_id": aluno})), StatusCode::OK)
        .await;
    assert_eq!(primeira["data"]["id"], segunda["data"]["id"]);
    assert_eq!(primeira["data"]["entrada"], segunda["data"]["entrada"]);

    let aula_id = primeira["data"]["aula_id"].as_i64().unwrap();
    let presenca = app
        .expect("GET", &format!("/api/aulas/{aula_id}/presenca"), &token, None, StatusCode::OK)
        .await;
    let linhas = presenca["data"].as_array().unwrap();
    assert_eq!(linhas.len(), 1);
    assert_eq!(linhas[0]["aluno_nome"], json!("Pedro"));
}

#[tokio::test]
async fn pickup_requires_an_authorized_name() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin").await;
    let prof = app.create_staff("carla", "Tia Carla", Role::Professor).await;

    let ana = app
        .create_aluno(
            &prof,
            json!({"nome": "Ana", "responsavel": "Maria", "autorizado_retirar": "Maria"}),
        )
        .await;
    let aula = app.iniciar(&prof, "Criação").await;
    let aula_id = aula["data"]["aula"]["id"].as_i64().unwrap();

    let entrada = app
        .expect("POST", "/api/aulas/entrada", &prof, Some(json!({"aluno_id": ana})), StatusCode::OK)
        .await;
    let frequencia_id = entrada["data"]["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "POST",
            "/api/aulas/saida",
            Some(&prof),
            Some(json!({"frequencia_id": frequencia_id, "retirado_por": "João"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));

    // Só o admin pode forçar
    let (status, _) = app
        .request(
            "POST",
            "/api/aulas/saida",
            Some(&prof),
            Some(json!({"frequencia_id": frequencia_id, "retirado_por": "João", "forcar": true})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let saida: Option<String> = sqlx::query_scalar("SELECT saida FROM frequencia WHERE id = ?1")
        .bind(frequencia_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert!(saida.is_none());

    let ok = app
        .expect(
            "POST",
            "/api/aulas/saida",
            &prof,
            Some(json!({"aula_id": aula_id, "aluno_id": ana, "retirado_por": " maria "})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(ok["data"]["retirado_por"], json!("maria"));
    assert_eq!(ok["data"]["liberado_por_admin"], json!(false));
    assert_eq!(ok["data"]["entrada"], entrada["data"]["entrada"]);
    assert!(ok["data"]["saida"].is_string());

    let forcada = app
        .expect(
            "POST",
            "/api/aulas/saida",
            &admin,
            Some(json!({"frequencia_id": frequencia_id, "retirado_por": "João", "forcar": true})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(forcada["data"]["liberado_por_admin"], json!(true));

    app.expect(
        "POST",
        "/api/aulas/saida",
        &prof,
        Some(json!({"frequencia_id": frequencia_id, "retirado_por": "   "})),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.expect(
        "POST",
        "/api/aulas/saida",
        &prof,
        Some(json!({"aluno_id": ana, "retirado_por": "Maria"})),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn checkout_without_check_in_infers_entrada() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin").await;
    // Sem autorizados: qualquer nome serve
    let aluno = app.create_aluno(&token, json!({"nome": "Lucas"})).await;
    let aula = app.iniciar(&token, "Daniel").await;
    let aula_id = aula["data"]["aula"]["id"].as_i64().unwrap();

    let saida = app
        .expect(
            "POST",
            "/api/aulas/saida",
            &token,
            Some(json!({"aula_id": aula_id, "aluno_id": aluno, "retirado_por": "Avó Rosa"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(saida["data"]["entrada_inferida"], json!(true));
    assert_eq!(saida["data"]["entrada"], saida["data"]["saida"]);

    // Entrada depois da saída não reescreve a hora inferida
    let entrada = app
        .expect("POST", "/api/aulas/entrada", &token, Some(json!({"aluno_id": aluno})), StatusCode::OK)
        .await;
    assert_eq!(entrada["data"]["entrada"], saida["data"]["entrada"]);
}

#[tokio::test]
async fn students_are_listed_filtered_and_soft_deleted() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin").await;
    let bia = app.create_aluno(&token, json!({"nome": "Beatriz"})).await;
    app.create_aluno(&token, json!({"nome": "Artur"})).await;

    app.expect("POST", "/api/alunos", &token, Some(json!({"nome": ""})), StatusCode::BAD_REQUEST)
        .await;

    let todos = app.expect("GET", "/api/alunos", &token, None, StatusCode::OK).await;
    let nomes: Vec<&str> = todos["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["nome"].as_str().unwrap())
        .collect();
    assert_eq!(nomes, vec!["Artur", "Beatriz"]);

    let filtrados = app.expect("GET", "/api/alunos?busca=bea", &token, None, StatusCode::OK).await;
    assert_eq!(filtrados["data"].as_array().unwrap().len(), 1);

    app.expect("DELETE", &format!("/api/alunos/{bia}"), &token, None, StatusCode::OK)
        .await;
    app.expect("GET", &format!("/api/alunos/{bia}"), &token, None, StatusCode::NOT_FOUND)
        .await;
    let restantes = app.expect("GET", "/api/alunos", &token, None, StatusCode::OK).await;
    assert_eq!(restantes["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn staff_management_is_admin_only() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin").await;
    let aux = app.create_staff("rute", "Rute", Role::Auxiliar).await;

    let equipe = app.expect("GET", "/api/equipe", &aux, None, StatusCode::OK).await;
    assert_eq!(equipe["data"].as_array().unwrap().len(), 2);

    app.expect(
        "POST",
        "/api/usuarios",
        &aux,
        Some(json!({"nome": "X", "usuario": "x", "senha": "x"})),
        StatusCode::FORBIDDEN,
    )
    .await;

    let criado = app
        .expect(
            "POST",
            "/api/usuarios",
            &admin,
            Some(json!({"nome": "Paulo", "usuario": "paulo", "senha": "abc", "role": "professor"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(criado["data"]["role"], json!("professor"));
    let paulo = criado["data"]["id"].as_i64().unwrap();

    app.expect(
        "POST",
        "/api/usuarios",
        &admin,
        Some(json!({"nome": "Outro", "usuario": "paulo", "senha": "abc"})),
        StatusCode::BAD_REQUEST,
    )
    .await;

    let admin_id = app.expect("GET", "/api/me", &admin, None, StatusCode::OK).await["data"]["id"]
        .as_i64()
        .unwrap();
    app.expect(
        "DELETE",
        &format!("/api/usuarios/{admin_id}"),
        &admin,
        None,
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.expect(
        "PUT",
        &format!("/api/usuarios/{admin_id}"),
        &admin,
        Some(json!({"nome": "Administrador", "usuario": "admin", "role": "professor"})),
        StatusCode::BAD_REQUEST,
    )
    .await;

    app.expect("DELETE", &format!("/api/usuarios/{paulo}"), &admin, None, StatusCode::OK)
        .await;
    let (status, _) = app
        .request("POST", "/api/login", None, Some(json!({"usuario": "paulo", "senha": "abc"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bulletin_likes_toggle_and_pins_are_admin_only() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin").await;
    let prof = app.create_staff("carla", "Tia Carla", Role::Professor).await;

    let antigo = app
        .expect("POST", "/api/avisos", &prof, Some(json!({"mensagem": "Ensaio sábado"})), StatusCode::CREATED)
        .await["data"]["id"]
        .as_i64()
        .unwrap();
    let novo = app
        .expect("POST", "/api/avisos", &prof, Some(json!({"mensagem": "Lanche"})), StatusCode::CREATED)
        .await["data"]["id"]
        .as_i64()
        .unwrap();
    app.expect("POST", "/api/avisos", &prof, Some(json!({})), StatusCode::BAD_REQUEST)
        .await;

    let like = app
        .expect("POST", &format!("/api/avisos/{novo}/like"), &prof, None, StatusCode::OK)
        .await;
    assert_eq!(like["data"], json!({"curtido": true, "likes": 1}));
    let unlike = app
        .expect("POST", &format!("/api/avisos/{novo}/like"), &prof, None, StatusCode::OK)
        .await;
    assert_eq!(unlike["data"], json!({"curtido": false, "likes": 0}));

    app.expect(
        "POST",
        &format!("/api/avisos/{antigo}/fixar"),
        &prof,
        Some(json!({"fixado": true})),
        StatusCode::FORBIDDEN,
    )
    .await;
    app.expect(
        "POST",
        &format!("/api/avisos/{antigo}/fixar"),
        &admin,
        Some(json!({"fixado": true})),
        StatusCode::OK,
    )
    .await;
    let lista = app.expect("GET", "/api/avisos", &prof, None, StatusCode::OK).await;
    assert_eq!(lista["data"][0]["id"].as_i64(), Some(antigo));
    assert_eq!(lista["data"][0]["fixado"], json!(true));

    let comentario = app
        .expect(
            "POST",
            &format!("/api/avisos/{novo}/comentarios"),
            &admin,
            Some(json!({"texto": "Eu levo o suco"})),
            StatusCode::CREATED,
        )
        .await["data"]["id"]
        .as_i64()
        .unwrap();
    app.expect("DELETE", &format!("/api/comentarios/{comentario}"), &prof, None, StatusCode::FORBIDDEN)
        .await;
    let comentarios = app
        .expect("GET", &format!("/api/avisos/{novo}/comentarios"), &prof, None, StatusCode::OK)
        .await;
    assert_eq!(comentarios["data"][0]["usuario_nome"], json!("Administrador"));

    app.expect("DELETE", &format!("/api/avisos/{novo}"), &prof, None, StatusCode::FORBIDDEN)
        .await;
    app.expect("DELETE", &format!("/api/avisos/{novo}"), &admin, None, StatusCode::OK)
        .await;
    app.expect("POST", &format!("/api/avisos/{novo}/like"), &prof, None, StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn session_report_is_exported_as_csv_and_html() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin").await;
    let aluno = app
        .create_aluno(&token, json!({"nome": "Sofia, a pequena", "responsavel": "Marta"}))
        .await;
    let aula = app.iniciar(&token, "Parábolas").await;
    let aula_id = aula["data"]["aula"]["id"].as_i64().unwrap();
    app.expect("POST", "/api/aulas/entrada", &token, Some(json!({"aluno_id": aluno})), StatusCode::OK)
        .await;

    let json = app
        .expect("GET", &format!("/api/aulas/{aula_id}/relatorio"), &token, None, StatusCode::OK)
        .await;
    assert_eq!(json["data"]["resumo"]["total"], json!(1));
    assert_eq!(json["data"]["resumo"]["presentes"], json!(1));

    let request = Request::builder()
        .uri(format!("/api/aulas/{aula_id}/relatorio.csv"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, bytes, content_type) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("aluno,responsavel,"));
    assert!(csv.contains("\"Sofia, a pequena\",Marta,"));

    let request = Request::builder()
        .uri(format!("/api/aulas/{aula_id}/relatorio.html"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, bytes, content_type) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    let html = String::from_utf8(bytes).unwrap();
    assert!(html.contains("Parábolas"));
    assert!(html.contains("Sofia, a pequena"));

    app.expect("GET", "/api/aulas/999/relatorio", &token, None, StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn bad_json_bodies_get_the_error_envelope() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin").await;
    app.iniciar(&token, "Zaqueu").await;

    let body = app
        .expect("POST", "/api/aulas/entrada", &token, Some(json!({})), StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("aluno_id"));

    let request = Request::builder()
        .method("POST")
        .uri("/api/aulas/entrada")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("isto não é json"))
        .unwrap();
    let (status, bytes, content_type) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.unwrap().starts_with("application/json"));
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));

    // Sem Content-Type também sai no envelope
    let (status, body) = app.request("POST", "/api/login", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn role_aliases_are_accepted_when_creating_staff() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin").await;

    let criado = app
        .expect(
            "POST",
            "/api/usuarios",
            &admin,
            Some(json!({"nome": "Rute", "usuario": "rute", "senha": "abc", "role": "auxiliary"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(criado["data"]["role"], json!("auxiliar"));

    let criado = app
        .expect(
            "POST",
            "/api/usuarios",
            &admin,
            Some(json!({"nome": "Carla", "usuario": "carla", "senha": "abc", "role": "Professora"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(criado["data"]["role"], json!("professor"));

    app.expect(
        "POST",
        "/api/usuarios",
        &admin,
        Some(json!({"nome": "X", "usuario": "x", "senha": "abc", "role": "pastor"})),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn users_change_their_own_password() {
    let app = TestApp::spawn().await;
    let token = app.create_staff("rute", "Rute", Role::Auxiliar).await;

    app.expect(
        "PUT",
        "/api/me/senha",
        &token,
        Some(json!({"senha_atual": "errada", "nova_senha": "nova"})),
        StatusCode::UNAUTHORIZED,
    )
    .await;
    app.expect(
        "PUT",
        "/api/me/senha",
        &token,
        Some(json!({"senha_atual": "senha", "nova_senha": "  "})),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.expect(
        "PUT",
        "/api/me/senha",
        &token,
        Some(json!({"senha_atual": "senha", "nova_senha": "nova"})),
        StatusCode::OK,
    )
    .await;

    let (status, _) = app
        .request("POST", "/api/login", None, Some(json!({"usuario": "rute", "senha": "senha"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app
        .request("POST", "/api/login", None, Some(json!({"usuario": "rute", "senha": "nova"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["usuario"], json!("rute"));
}

#[tokio::test]
async fn students_can_be_updated() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin").await;
    let id = app.create_aluno(&token, json!({"nome": "Tiago"})).await;

    let atualizado = app
        .expect(
            "PUT",
            &format!("/api/alunos/{id}"),
            &token,
            Some(json!({"nome": " Tiago Silva ", "responsavel": "Marta", "autorizado_2": "  "})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(atualizado["data"]["nome"], json!("Tiago Silva"));
    assert_eq!(atualizado["data"]["responsavel"], json!("Marta"));
    assert_eq!(atualizado["data"]["autorizado_2"], json!(null));

    app.expect(
        "PUT",
        &format!("/api/alunos/{id}"),
        &token,
        Some(json!({"nome": ""})),
        StatusCode::BAD_REQUEST,
    )
    .await;
    app.expect(
        "PUT",
        "/api/alunos/9999",
        &token,
        Some(json!({"nome": "Ninguém"})),
        StatusCode::NOT_FOUND,
    )
    .await;

    let lido = app.expect("GET", &format!("/api/alunos/{id}"), &token, None, StatusCode::OK).await;
    assert_eq!(lido["data"]["nome"], json!("Tiago Silva"));
}

#[tokio::test]
async fn session_history_is_newest_first() {
    let app = TestApp::spawn().await;
    let token = app.token_for("admin").await;
    let primeira = app.iniciar(&token, "Moisés").await["data"]["aula"]["id"].as_i64().unwrap();
    let segunda = app.iniciar(&token, "Josué").await["data"]["aula"]["id"].as_i64().unwrap();

    let historico = app.expect("GET", "/api/aulas", &token, None, StatusCode::OK).await;
    let ids: Vec<i64> = historico["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![segunda, primeira]);
    assert!(historico["data"][1]["encerrada_em"].is_string());
    assert_eq!(historico["data"][0]["encerrada_em"], json!(null));

    let limitado = app.expect("GET", "/api/aulas?limite=1", &token, None, StatusCode::OK).await;
    assert_eq!(limitado["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn comments_are_deleted_by_author_or_admin_and_posts_unpinned() {
    let app = TestApp::spawn().await;
    let admin = app.token_for("admin").await;
    let prof = app.create_staff("carla", "Tia Carla", Role::Professor).await;

    let aviso = app
        .expect("POST", "/api/avisos", &prof, Some(json!({"mensagem": "Culto infantil"})), StatusCode::CREATED)
        .await["data"]["id"]
        .as_i64()
        .unwrap();
    let mut ids = Vec::new();
    for texto in ["Eu ajudo", "Levo lápis de cor"] {
        let v = app
            .expect(
                "POST",
                &format!("/api/avisos/{aviso}/comentarios"),
                &prof,
                Some(json!({"texto": texto})),
                StatusCode::CREATED,
            )
            .await;
        ids.push(v["data"]["id"].as_i64().unwrap());
    }
    let (do_autor, outro) = (ids[0], ids[1]);

    app.expect("DELETE", &format!("/api/comentarios/{do_autor}"), &prof, None, StatusCode::OK)
        .await;
    app.expect("DELETE", &format!("/api/comentarios/{outro}"), &admin, None, StatusCode::OK)
        .await;
    app.expect("DELETE", &format!("/api/comentarios/{outro}"), &admin, None, StatusCode::NOT_FOUND)
        .await;
    let restantes = app
        .expect("GET", &format!("/api/avisos/{aviso}/comentarios"), &prof, None, StatusCode::OK)
        .await;
    assert_eq!(restantes["data"], json!([]));

    app.expect(
        "POST",
        &format!("/api/avisos/{aviso}/fixar"),
        &admin,
        Some(json!({"fixado": true})),
        StatusCode::OK,
    )
    .await;
    let desafixado = app
        .expect(
            "POST",
            &format!("/api/avisos/{aviso}/fixar"),
            &admin,
            Some(json!({"fixado": false})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(desafixado["data"]["fixado"], json!(false));
    let lista = app.expect("GET", "/api/avisos", &prof, None, StatusCode::OK).await;
    assert_eq!(lista["data"][0]["fixado"], json!(false));
}

#[tokio::test]
async fn last_admin_survives_deletion_and_demotion_attempts() {
    let app = TestApp::spawn().await;
    app.create_staff("carla", "Tia Carla", Role::Professor).await;
    let admin = usuario_service::find_usuario_by_login(&app.pool, "admin")
        .await
        .unwrap()
        .unwrap();
    let carla = usuario_service::find_usuario_by_login(&app.pool, "carla")
        .await
        .unwrap()
        .unwrap();

    let err = usuario_service::delete_usuario(&app.pool, admin.id, carla.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    // O UPDATE foi desfeito: o admin continua ativo e consegue autenticar-se
    let ainda = usuario_service::find_usuario_by_login(&app.pool, "admin")
        .await
        .unwrap()
        .expect("admin removido");
    assert!(ainda.ativo);
    assert_eq!(ainda.role, Role::Admin);

    let err = usuario_service::delete_usuario(&app.pool, 9999, carla.id)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

    // Com um segundo admin, o primeiro já pode sair
    let admin2 = app.create_staff("paulo", "Paulo", Role::Admin).await;
    app.expect("DELETE", &format!("/api/usuarios/{}", admin.id), &admin2, None, StatusCode::OK)
        .await;
    let (status, _) = app
        .request("POST", "/api/login", None, Some(json!({"usuario": "admin", "senha": "1234"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
