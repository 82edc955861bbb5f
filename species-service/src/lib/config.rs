use std::env;

use config::builder::ConfigBuilder;
use config::builder::DefaultState;
use config::Config as Configuration;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Upper bound for multipart image uploads
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_minutes: i64,
}

impl JwtConfig {
    /// HS256 keys shorter than the hash output are rejected outright.
    pub const MIN_SECRET_BYTES: usize = 32;

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < Self::MIN_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes, got {}",
                Self::MIN_SECRET_BYTES,
                self.secret.len()
            )));
        }
        if self.expiration_minutes <= 0 {
            return Err(ConfigError::Message(
                "jwt.expiration_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the pre-trained network is served and how its output is decoded.
#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    /// Base URL of the TensorFlow-Serving compatible REST endpoint
    pub endpoint: String,
    pub model: String,
    /// One label per line, indexed by output position
    pub labels_path: Option<String>,
    pub top_k: usize,
    /// Side length of the square input tensor
    pub input_size: u32,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from defaults, files and environment variables
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults (every key except `jwt.secret`)
    ///
    /// # Errors
    /// Fails when `jwt.secret` is unset or too short.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = Self::with_defaults(Configuration::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_configuration(configuration)
    }

    fn from_configuration(configuration: Configuration) -> Result<Self, ConfigError> {
        let config: Self = configuration.try_deserialize()?;
        config.jwt.validate()?;
        Ok(config)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("database.url", "sqlite://species.db?mode=rwc")?
            .set_default("database.max_connections", 5_i64)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.http_port", 8000_i64)?
            .set_default("server.max_upload_bytes", 10_i64 * 1024 * 1024)?
            .set_default("jwt.expiration_minutes", auth::DEFAULT_TOKEN_VALIDITY_MINUTES)?
            .set_default("classifier.endpoint", "http://localhost:8501")?
            .set_default("classifier.model", "mobilenet_v2")?
            .set_default("classifier.top_k", 3_i64)?
            .set_default("classifier.input_size", 224_i64)?
            .set_default("classifier.timeout_secs", 10_i64)
    }
}
