use axum::http::StatusCode;
use serde::Serialize;

use super::ApiSuccess;

pub const WELCOME_MESSAGE: &str = "Welcome to the Organism Species Checker API";

pub async fn root() -> ApiSuccess<WelcomeResponseData> {
    ApiSuccess::new(
        StatusCode::OK,
        WelcomeResponseData {
            message: WELCOME_MESSAGE.to_string(),
        },
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomeResponseData {
    pub message: String,
}
