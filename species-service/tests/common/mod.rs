#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use auth::Authenticator;
use auth::TokenIssuer;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::Json;
use image::ImageFormat;
use image::Rgb;
use image::RgbImage;
use serde_json::json;
use serde_json::Value;
use species_service::config::ClassifierConfig;
use species_service::domain::user::service::UserService;
use species_service::inbound::http::router::create_router;
use species_service::outbound::classifier::Labels;
use species_service::outbound::classifier::TfServingClassifier;
use species_service::outbound::repositories::SqliteUserRepository;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

pub const MODEL_PATH: &str = "/v1/models/mobilenet_v2:predict";

/// Labels served by the stub model, in output order
pub const LABELS: &str = "tench\ngoldfish\ngreat_white_shark\ntiger_shark\nhammerhead";

/// Probabilities the stub model returns for every image
pub const PROBABILITIES: [f64; 5] = [0.05, 0.7, 0.1, 0.15, 0.0];

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub api_client: reqwest::Client,
    pub issuer: TokenIssuer,
}

impl TestApp {
    /// Spawn the application with a stub model server behind it
    pub async fn spawn() -> Self {
        let model_address = spawn_model_server().await;
        Self::spawn_with_model_endpoint(&model_address).await
    }

    /// Spawn the application pointing at a model server that is not running
    pub async fn spawn_without_model_server() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        Self::spawn_with_model_endpoint(&address).await
    }

    async fn spawn_with_model_endpoint(model_endpoint: &str) -> Self {
        let pool = test_pool().await;

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
        let authenticator = Arc::new(Authenticator::new(JWT_SECRET));
        let user_service = Arc::new(UserService::new(user_repo, authenticator));

        let classifier_config = ClassifierConfig {
            endpoint: model_endpoint.to_string(),
            model: "mobilenet_v2".to_string(),
            labels_path: None,
            top_k: 3,
            input_size: 224,
            timeout_secs: 5,
        };
        let classifier = Arc::new(
            TfServingClassifier::new(&classifier_config, Labels::parse(LABELS))
                .expect("Failed to build classifier"),
        );

        let router = create_router(user_service, classifier, 10 * 1024 * 1024);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            pool,
            api_client: reqwest::Client::new(),
            issuer: TokenIssuer::new(JWT_SECRET),
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

    /// POST /users/ with a JSON body
    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/users/")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// POST /token with a form body
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/token")
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register then log in, returning the access token
    pub async fn register_and_login(&self, username: &str, password: &str) -> String {
        assert_eq!(self.register(username, password).await.status(), 200);

        let body: Value = self
            .login(username, password)
            .await
            .json()
            .await
            .expect("Failed to parse response");
        body["access_token"]
            .as_str()
            .expect("Missing access_token")
            .to_string()
    }

    /// POST an image as the `file` multipart field
    pub fn upload(&self, path: &str, bytes: Vec<u8>) -> reqwest::RequestBuilder {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name("upload.png")
            .mime_str("image/png")
            .expect("Invalid mime type");
        self.post(path)
            .multipart(reqwest::multipart::Form::new().part("file", part))
    }
}

/// In-memory database with the schema applied.
///
/// A single connection that never recycles keeps the database alive for the
/// whole test.
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

/// Stand-in for the model server: checks the request shape and returns a
/// fixed probability vector.
async fn spawn_model_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://{}", listener.local_addr().unwrap());

    let router = axum::Router::new().fallback(stub_predict);
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Stub model server error");
    });

    address
}

async fn stub_predict(uri: Uri, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if uri.path() != MODEL_PATH {
        return (StatusCode::NOT_FOUND, Json(json!({ "error": "no such model" })));
    }

    let instance = &body["instances"][0];
    let well_formed = instance.as_array().map(|rows| rows.len()) == Some(224)
        && instance[0].as_array().map(|cols| cols.len()) == Some(224)
        && instance[0][0].as_array().map(|px| px.len()) == Some(3);

    if !well_formed {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "expected a 224x224x3 tensor" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "predictions": [PROBABILITIES] })),
    )
}

/// Solid-colour PNG
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(width, height, Rgb([30, 144, 255]))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}
