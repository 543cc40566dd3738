// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas abertas: saúde, documentação, login e o formulário público
    let public_routes = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/public/autorizacoes", post(handlers::public::submit_authorization));

    let user_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/users/me", get(handlers::users::get_me))
        .route(
            "/api/users",
            post(handlers::users::create_user).get(handlers::users::list_users),
        );

    let authorization_routes = Router::new()
        .route("/api/autorizacoes", post(handlers::authorizations::create_authorization))
        .route("/api/autorizacoes/eventos", get(handlers::events::stream_view))
        .route("/api/autorizacoes/distribuir", post(handlers::authorizations::distribute))
        .route("/api/autorizacoes/liberar", post(handlers::authorizations::release))
        .route("/api/autorizacoes/{id}", get(handlers::authorizations::get_authorization))
        .route("/api/autorizacoes/{id}/ficha", get(handlers::documents::ficha_pdf))
        .route("/api/autorizacoes/{id}/agendar", post(handlers::authorizations::schedule))
        .route("/api/autorizacoes/{id}/compareceu", post(handlers::authorizations::mark_attended))
        .route("/api/autorizacoes/{id}/nao-compareceu", post(handlers::authorizations::mark_no_show))
        .route("/api/autorizacoes/{id}/remarcado", post(handlers::authorizations::mark_rescheduled))
        .route(
            "/api/autorizacoes/{id}/telefone-incorreto",
            post(handlers::authorizations::mark_wrong_number),
        )
        .route(
            "/api/autorizacoes/{id}/sem-interesse",
            post(handlers::authorizations::mark_not_interested),
        );

    let dashboard_routes = Router::new()
        .route("/api/filas/distribuicao", get(handlers::queues::distribution_queue))
        .route("/api/filas/coordenacao", get(handlers::queues::coordinator_queue))
        .route("/api/filas/agendamento", get(handlers::queues::scheduling_queue))
        .route("/api/agenda", get(handlers::agenda::get_week))
        .route("/api/relatorios", get(handlers::reports::attendance_report))
        .route("/api/relatorios/narrativa", post(handlers::reports::narrative_report));

    // Tudo da equipe passa pelo auth_guard
    let protected_routes = user_routes
        .merge(authorization_routes)
        .merge(dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::{
        config::tests::test_config,
        db::memory_store::MemoryAuthorizationStore,
        models::auth::Role,
        services::{auth::tests::staff_user, narrator::DisabledNarrator},
    };

    fn test_state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new().connect_lazy(&config.database_url).unwrap();
        AppState::assemble(
            pool,
            Arc::new(MemoryAuthorizationStore::new()),
            Arc::new(DisabledNarrator),
            &config,
        )
        .unwrap()
    }

    fn token(state: &AppState, codigo: &str, role: Role) -> String {
        state.auth_service.create_token(&staff_user(codigo, role)).unwrap()
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ana() -> Value {
        json!({
            "nomeAluno": "Ana",
            "idade": 10,
            "serie": "5º Ano",
            "turno": "Manhã",
            "escola": "Escola X",
            "nomeResponsavel": "Maria",
            "telefone": "41999999999",
            "consent": true
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = build_router(test_state())
            .oneshot(request("GET", "/api/health", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn openapi_document_lists_lifecycle_routes() {
        let response = build_router(test_state())
            .oneshot(request("GET", "/api/openapi.json", None, None))
            .await
            .unwrap();
        let doc = json_body(response).await;
        assert!(doc["paths"]["/api/autorizacoes/distribuir"].is_object());
        assert!(doc["paths"]["/api/public/autorizacoes"].is_object());
    }

    #[tokio::test]
    async fn public_intake_creates_pending_record() {
        let response = build_router(test_state())
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(ana())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "pendente");
        assert_eq!(body["criadoPor"], "sistema");
        assert!(body["coordenadoraId"].is_null());
    }

    #[tokio::test]
    async fn intake_without_consent_returns_field_errors() {
        let mut payload = ana();
        payload["consent"] = json!(false);

        let response = build_router(test_state())
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(payload)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["details"]["consent"][0].as_str().unwrap().contains("consentimento"));
    }

    #[tokio::test]
    async fn staff_routes_require_a_token() {
        let response = build_router(test_state())
            .oneshot(request("GET", "/api/filas/distribuicao", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn error_messages_follow_accept_language() {
        let mut req = request("GET", "/api/filas/distribuicao", None, None);
        req.headers_mut()
            .insert(header::ACCEPT_LANGUAGE, "en-US".parse().unwrap());

        let response = build_router(test_state()).oneshot(req).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["error"], "Missing or invalid authentication token.");
    }

    #[tokio::test]
    async fn role_is_enforced_per_operation() {
        let state = test_state();
        let tele = token(&state, "T1", Role::Telemarketing);

        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/api/autorizacoes/distribuir",
                Some(&tele),
                Some(json!({ "ids": [], "coordenadoraId": "C1" })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["details"]["acao"], "distribuir");
    }

    #[tokio::test]
    async fn swagger_ui_is_served() {
        let response = build_router(test_state())
            .oneshot(request("GET", "/api/docs/", None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrongly_typed_field_is_a_localized_field_error() {
        let app = build_router(test_state());
        let mut payload = ana();
        payload["idade"] = json!("dez");

        let response = app
            .clone()
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "O corpo da requisição é inválido.");
        assert!(body["details"]["idade"][0].is_string());

        let mut payload = ana();
        payload["consent"] = json!("true");
        let response = app
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["details"]["consent"].is_array());
    }

    #[tokio::test]
    async fn idade_sent_as_text_is_accepted() {
        let mut payload = ana();
        payload["idade"] = json!("10");

        let response = build_router(test_state())
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(payload)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json_body(response).await["idade"], 10);
    }

    #[tokio::test]
    async fn body_without_json_content_type_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/public/autorizacoes")
            .header(header::ACCEPT_LANGUAGE, "en")
            .body(Body::from(ana().to_string()))
            .unwrap();

        let response = build_router(test_state()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn blank_coordinator_is_rejected_and_nothing_moves() {
        let state = test_state();
        let gestor = token(&state, "gestor", Role::Gestor);
        let app = build_router(state);

        let created = app
            .clone()
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(ana())))
            .await
            .unwrap();
        let id = json_body(created).await["id"].clone();

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/autorizacoes/distribuir",
                Some(&gestor),
                Some(json!({ "ids": [id], "coordenadoraId": "   " })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["details"]["coordenadora_id"][0], "Informe o ID da coordenadora.");

        let queue = app
            .oneshot(request("GET", "/api/filas/distribuicao", Some(&gestor), None))
            .await
            .unwrap();
        let queue = json_body(queue).await;
        assert_eq!(queue[0]["status"], "pendente");
        assert!(queue[0]["coordenadoraId"].is_null());
    }

    #[tokio::test]
    async fn distribution_is_guarded_by_current_status() {
        let state = test_state();
        let gestor = token(&state, "gestor", Role::Gestor);
        let app = build_router(state);

        let created = app
            .clone()
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(ana())))
            .await
            .unwrap();
        let id = json_body(created).await["id"].clone();
        let payload = json!({ "ids": [id], "coordenadoraId": "C1" });

        let first = app
            .clone()
            .oneshot(request("POST", "/api/autorizacoes/distribuir", Some(&gestor), Some(payload.clone())))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let body = json_body(first).await;
        assert_eq!(body[0]["status"], "distribuido");
        assert_eq!(body[0]["gestorId"], "gestor");

        let second = app
            .oneshot(request("POST", "/api/autorizacoes/distribuir", Some(&gestor), Some(payload)))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = json_body(second).await;
        assert_eq!(body["details"]["statusAtual"], "distribuido");
    }

    #[tokio::test]
    async fn coordinator_queue_comes_from_the_token() {
        let state = test_state();
        let gestor = token(&state, "gestor", Role::Gestor);
        let c1 = token(&state, "C1", Role::Coordenadora);
        let c2 = token(&state, "C2", Role::Coordenadora);
        let app = build_router(state);

        let created = app
            .clone()
            .oneshot(request("POST", "/api/public/autorizacoes", None, Some(ana())))
            .await
            .unwrap();
        let id = json_body(created).await["id"].clone();
        app.clone()
            .oneshot(request(
                "POST",
                "/api/autorizacoes/distribuir",
                Some(&gestor),
                Some(json!({ "ids": [id], "coordenadoraId": "C1" })),
            ))
            .await
            .unwrap();

        let mine = app
            .clone()
            .oneshot(request("GET", "/api/filas/coordenacao", Some(&c1), None))
            .await
            .unwrap();
        assert_eq!(json_body(mine).await.as_array().unwrap().len(), 1);

        let theirs = app
            .oneshot(request("GET", "/api/filas/coordenacao", Some(&c2), None))
            .await
            .unwrap();
        assert!(json_body(theirs).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let state = test_state();
        let tele = token(&state, "T1", Role::Telemarketing);
        let uri = format!("/api/autorizacoes/{}/compareceu", uuid::Uuid::new_v4());

        let response = build_router(state)
            .oneshot(request("POST", &uri, Some(&tele), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn narrative_report_without_generator_is_unavailable() {
        let state = test_state();
        let gestor = token(&state, "gestor", Role::Gestor);

        let response = build_router(state)
            .oneshot(request(
                "POST",
                "/api/relatorios/narrativa",
                Some(&gestor),
                Some(json!({ "tipo": "escola", "valor": "Escola X" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn attendance_report_is_available_to_coordinators() {
        let state = test_state();
        let coord = token(&state, "C1", Role::Coordenadora);

        let response = build_router(state)
            .oneshot(request("GET", "/api/relatorios?tipo=escola&valor=Escola%20X", Some(&coord), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["resumo"]["total"], 0);
        assert_eq!(body["resumo"]["taxaComparecimento"], 0.0);
    }

    #[tokio::test]
    async fn logout_invalidates_the_token() {
        let state = test_state();
        let gestor = token(&state, "gestor", Role::Gestor);
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/logout", Some(&gestor), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", "/api/users/me", Some(&gestor), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
