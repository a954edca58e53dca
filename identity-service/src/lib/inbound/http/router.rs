use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::get_profile::get_profile;
use super::handlers::login::login;
use super::handlers::register::register;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use crate::account::service::AccountService;
use crate::outbound::notifications::HttpCompanionNotifier;
use crate::outbound::repositories::SqliteAccountRepository;

pub type IdentityService = AccountService<SqliteAccountRepository, HttpCompanionNotifier>;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<IdentityService>,
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(
    account_service: Arc<IdentityService>,
    authenticator: Arc<Authenticator>,
) -> Router {
    let state = AppState {
        account_service,
        authenticator,
    };

    let public_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login));

    let protected_routes = Router::new()
        .route("/auth/profile", get(get_profile).put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Headers are left out of the span: they carry bearer tokens.
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::header;
    use axum::http::StatusCode;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"router-test-secret";

    fn router() -> Router {
        // Never touched: every request below is rejected before reaching the store.
        let pool = SqlitePoolOptions::new()
            .connect_lazy("sqlite::memory:")
            .unwrap();
        let authenticator = Arc::new(Authenticator::new(SECRET).unwrap());
        let service = AccountService::new(
            Arc::new(SqliteAccountRepository::new(pool)),
            Arc::new(HttpCompanionNotifier::new("http://127.0.0.1:9/api/sync")),
            Arc::clone(&authenticator),
            Duration::from_millis(100),
        );
        create_router(Arc::new(service), authenticator)
    }

    async fn profile_status(authorization: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().uri("/auth/profile");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = router()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status()
    }

    #[tokio::test]
    async fn test_profile_requires_credentials() {
        assert_eq!(profile_status(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            profile_status(Some("Basic abc")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            profile_status(Some("Bearer not-a-token")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_token_with_bad_subject_is_rejected() {
        let authenticator = Authenticator::new(SECRET).unwrap();
        let claims = auth::Claims::new(
            "not-a-uuid",
            "a@x.com",
            "Alice",
            "a@x.com",
            chrono::Utc::now(),
        );
        let token = authenticator.generate_token(&claims).unwrap();

        let status = profile_status(Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json_body_is_bad_request() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"username\":"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
