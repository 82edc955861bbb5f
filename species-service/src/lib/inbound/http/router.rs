use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::create_user::create_user;
use super::handlers::get_current_user::get_current_user;
use super::handlers::login::login;
use super::handlers::predict::predict_microbe;
use super::handlers::predict::predict_organism;
use super::handlers::root::root;
use super::middleware::optional_bearer;
use super::middleware::require_bearer;
use crate::domain::classification::ports::ImageClassifier;
use crate::domain::user::service::UserService;
use crate::outbound::repositories::user::SqliteUserRepository;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService<SqliteUserRepository>>,
    pub classifier: Arc<dyn ImageClassifier>,
}

pub fn create_router(
    user_service: Arc<UserService<SqliteUserRepository>>,
    classifier: Arc<dyn ImageClassifier>,
    max_upload_bytes: usize,
) -> Router {
    let state = AppState {
        user_service,
        classifier,
    };

    let public_routes = Router::new()
        .route("/", get(root))
        .route("/token", post(login))
        .route("/users/", post(create_user));

    let protected_routes = Router::new()
        .route("/users/me/", get(get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer,
        ));

    let prediction_routes = Router::new()
        .route("/predict", post(predict_organism))
        .route("/predict_microbe", post(predict_microbe))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_bearer,
        ))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

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
        .merge(prediction_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
