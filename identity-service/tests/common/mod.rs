use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::JwtHandler;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

use identity_service::account::service::AccountService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::notifications::HttpCompanionNotifier;
use identity_service::outbound::repositories::SqliteAccountRepository;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
    pub companion: StubCompanion,
}

/// Companion stand-in that records every sync payload it receives
pub struct StubCompanion {
    pub sync_url: String,
    received: Mutex<mpsc::UnboundedReceiver<Value>>,
}

impl StubCompanion {
    pub async fn spawn() -> Self {
        let (sender, received) = mpsc::unbounded_channel();
        let app = Router::new().route(
            "/api/sync",
            post(move |Json(body): Json<Value>| {
                let sender = sender.clone();
                async move {
                    let _ = sender.send(body);
                    StatusCode::OK
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind companion port");
        let sync_url = format!("http://{}/api/sync", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Companion error");
        });

        Self {
            sync_url,
            received: Mutex::new(received),
        }
    }

    /// Wait for the next sync payload.
    pub async fn next_payload(&self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.received.lock().await.recv())
            .await
            .expect("Companion was never notified")
            .expect("Companion channel closed")
    }
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let pool = test_pool().await;
        let companion = StubCompanion::spawn().await;

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = format!("http://{}", listener.local_addr().unwrap());

        let authenticator =
            Arc::new(Authenticator::new(TEST_SECRET).expect("Failed to build authenticator"));
        let account_service = Arc::new(AccountService::new(
            Arc::new(SqliteAccountRepository::new(pool.clone())),
            Arc::new(HttpCompanionNotifier::new(companion.sync_url.clone())),
            Arc::clone(&authenticator),
            Duration::from_secs(2),
        ));

        let router = create_router(account_service, authenticator);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            pool,
            api_client: reqwest::Client::new(),
            jwt_handler: JwtHandler::new(TEST_SECRET),
            companion,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account and return the response body.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Value {
        let response = self
            .post("/auth/register")
            .json(&serde_json::json!({
                "username": username,
                "name": "Alice",
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }
}

/// Fresh in-memory database with migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}
