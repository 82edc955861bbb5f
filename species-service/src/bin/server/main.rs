use std::sync::Arc;

use auth::Authenticator;
use chrono::Duration;
use species_service::config::Config;
use species_service::domain::user::service::UserService;
use species_service::inbound::http::router::create_router;
use species_service::outbound::classifier::Labels;
use species_service::outbound::classifier::TfServingClassifier;
use species_service::outbound::repositories::SqliteUserRepository;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "species_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "species-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        token_validity_minutes = config.jwt.expiration_minutes,
        classifier_endpoint = %config.classifier.endpoint,
        classifier_model = %config.classifier.model,
        "Configuration loaded"
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "sqlite",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(database = "sqlite", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::with_validity(
        config.jwt.secret.as_bytes(),
        Duration::minutes(config.jwt.expiration_minutes),
    ));
    let user_repository = Arc::new(SqliteUserRepository::new(pool));
    let user_service = Arc::new(UserService::new(user_repository, authenticator));

    let labels = match &config.classifier.labels_path {
        Some(path) => {
            let labels = Labels::from_file(path)?;
            tracing::info!(path = %path, count = labels.len(), "Class labels loaded");
            labels
        }
        None => {
            tracing::warn!("No labels file configured, predictions will use class indices");
            Labels::default()
        }
    };
    let classifier = Arc::new(TfServingClassifier::new(&config.classifier, labels)?);
    tracing::info!(url = %classifier.predict_url(), "Classifier configured");

    let http_address = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(user_service, classifier, config.server.max_upload_bytes);

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
