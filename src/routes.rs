// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn app_router(app_state: AppState) -> Router {
    let settings_routes = Router::new()
        .route("/kwh-price"
               ,get(handlers::settings::get_kwh_price)
               .put(handlers::settings::update_kwh_price)
        )
        .route("/kwh-price/history", get(handlers::settings::get_kwh_price_history));

    let commission_routes = Router::new()
        .route("/", get(handlers::commissions::list_all))
        .route("/calculate", post(handlers::commissions::calculate))
        .route("/pending", get(handlers::commissions::list_pending))
        .route("/consumers/{consumer_id}", post(handlers::commissions::create_for_consumer))
        .route("/{id}/pay", patch(handlers::commissions::mark_as_paid))
        .route("/representatives/{id}", get(handlers::commissions::list_for_representative))
        .route("/representatives/{id}/stats", get(handlers::commissions::get_stats))
        .route("/representatives/{id}/period", get(handlers::commissions::list_by_period));

    let generator_routes = Router::new()
        .route("/"
               ,get(handlers::generators::list_generators)
               .post(handlers::generators::create_generator)
        )
        .route("/{id}"
               ,get(handlers::generators::get_generator)
               .put(handlers::generators::update_generator)
               .delete(handlers::generators::delete_generator)
        )
        .route("/{id}/capacity", get(handlers::generators::get_capacity));

    let consumer_routes = Router::new()
        .route("/"
               ,get(handlers::consumers::list_consumers)
               .post(handlers::consumers::create_consumer)
        )
        .route("/{id}", get(handlers::consumers::get_consumer))
        .route("/{id}/allocate", post(handlers::consumers::allocate_consumer))
        .route("/{id}/deallocate", post(handlers::consumers::deallocate_consumer));

    // Área do representante
    let representative_area_routes = Router::new()
        .route("/consumers", post(handlers::consumers::submit_consumer));

    let approval_routes = Router::new()
        .route("/consumers", get(handlers::approvals::list_pending_consumers))
        .route("/consumers/{id}/approve", post(handlers::approvals::approve_consumer))
        .route("/consumers/{id}/reject", post(handlers::approvals::reject_consumer));

    let change_request_routes = Router::new()
        .route("/", post(handlers::change_requests::create_change_request))
        .route("/pending", get(handlers::change_requests::list_pending_change_requests))
        .route("/mine", get(handlers::change_requests::list_my_change_requests))
        .route("/{id}/approve", post(handlers::change_requests::approve_change_request))
        .route("/{id}/reject", post(handlers::change_requests::reject_change_request));

    let representative_routes = Router::new()
        .route("/"
               ,get(handlers::representatives::list_representatives)
               .post(handlers::representatives::create_representative)
        )
        .route("/{id}", get(handlers::representatives::get_representative))
        .route("/{id}/status", patch(handlers::representatives::update_representative_status));

    // Tudo abaixo exige um Bearer válido; o perfil é checado em cada handler
    let protected_routes = Router::new()
        .nest("/settings", settings_routes)
        .nest("/commissions", commission_routes)
        .nest("/generators", generator_routes)
        .nest("/consumers", consumer_routes)
        .nest("/representative", representative_area_routes)
        .nest("/approvals", approval_routes)
        .nest("/change-requests", change_request_routes)
        .nest("/representatives", representative_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        models::auth::Role,
        services::auth::tests::{token_for, SECRET},
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use uuid::Uuid;

    // Pool preguiçoso: nenhum destes testes chega ao banco
    fn app() -> Router {
        let config = Config {
            database_url: "postgres://localhost/energia_test".into(),
            jwt_secret: SECRET.into(),
            bind_addr: "127.0.0.1:0".into(),
            max_connections: 1,
            enforce_headroom: true,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("url válida");
        app_router(AppState::with_pool(pool, &config).expect("estado"))
    }

    fn bearer(role: Role) -> String {
        format!("Bearer {}", token_for(Uuid::new_v4(), role, SECRET, 3600))
    }

    fn json_request(method: &str, uri: &str, auth: Option<String>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let response = app()
            .oneshot(Request::builder().uri("/api/commissions").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["kind"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let token = token_for(Uuid::new_v4(), Role::Admin, SECRET, -3600);
        let request = Request::builder()
            .uri("/api/generators")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn representative_cannot_reach_staff_routes() {
        let request = Request::builder()
            .uri("/api/generators")
            .header(header::AUTHORIZATION, bearer(Role::Representative))
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["kind"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn errors_follow_accept_language() {
        let request = Request::builder()
            .uri("/api/generators")
            .header(header::AUTHORIZATION, bearer(Role::Representative))
            .header(header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(body_json(response).await["error"], "Seu perfil não tem acesso a esta operação.");
    }

    #[tokio::test]
    async fn zero_price_is_rejected() {
        let request = json_request("PUT", "/api/settings/kwh-price", Some(bearer(Role::Admin)), json!({ "price": 0 }));

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["kind"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn manager_cannot_change_the_price() {
        let request = json_request("PUT", "/api/settings/kwh-price", Some(bearer(Role::Manager)), json!({ "price": 1.1 }));

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn allocation_above_one_hundred_percent_is_rejected() {
        let uri = format!("/api/consumers/{}/allocate", Uuid::new_v4());
        let request = json_request(
            "POST",
            &uri,
            Some(bearer(Role::Operator)),
            json!({ "generatorId": Uuid::new_v4(), "percentage": 150 }),
        );

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn calculate_with_explicit_price_needs_no_database() {
        let request = json_request(
            "POST",
            "/api/commissions/calculate",
            Some(bearer(Role::Representative)),
            json!({ "kwhConsumption": 1200, "kwhPrice": 0.80 }),
        );

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["commissionValue"], json!(336.0));
        assert_eq!(body["invoiceValue"], json!(960.0));
        assert_eq!(body["rate"], json!(0.35));
    }

    #[tokio::test]
    async fn representative_cannot_read_another_representatives_commissions() {
        let uri = format!("/api/commissions/representatives/{}", Uuid::new_v4());
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(Role::Representative))
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
