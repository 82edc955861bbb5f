use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::classification::models::Prediction;
use crate::classification::models::PredictionKind;
use crate::inbound::http::middleware::CurrentUser;
use crate::inbound::http::router::AppState;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// `POST /predict`
pub async fn predict_organism(
    State(state): State<AppState>,
    caller: Option<Extension<CurrentUser>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiSuccess<PredictionResponseData>, ApiError> {
    classify_upload(state, caller, multipart?, PredictionKind::Organism).await
}

/// `POST /predict_microbe`
pub async fn predict_microbe(
    State(state): State<AppState>,
    caller: Option<Extension<CurrentUser>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiSuccess<PredictionResponseData>, ApiError> {
    classify_upload(state, caller, multipart?, PredictionKind::Microbe).await
}

async fn classify_upload(
    state: AppState,
    caller: Option<Extension<CurrentUser>>,
    multipart: Multipart,
    kind: PredictionKind,
) -> Result<ApiSuccess<PredictionResponseData>, ApiError> {
    let image = read_file_field(multipart).await?;

    let username = caller
        .as_ref()
        .map(|Extension(CurrentUser(user))| user.username.as_str())
        .unwrap_or("anonymous");

    let prediction = state.classifier.classify(&image).await.map_err(|e| {
        tracing::warn!(kind = kind.as_str(), username, error = %e, "Classification failed");
        ApiError::from(e)
    })?;

    tracing::info!(
        kind = kind.as_str(),
        username,
        bytes = image.len(),
        top_label = prediction.first().map(|p| p.label.as_str()).unwrap_or(""),
        "Image classified"
    );

    Ok(ApiSuccess::new(
        StatusCode::OK,
        PredictionResponseData { prediction },
    ))
}

async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() == Some(FILE_FIELD) {
            return field
                .bytes()
                .await
                .map(|bytes| bytes.to_vec())
                .map_err(|e| ApiError::BadRequest(e.to_string()));
        }
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field `{FILE_FIELD}`"
    )))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponseData {
    pub prediction: Vec<Prediction>,
}
