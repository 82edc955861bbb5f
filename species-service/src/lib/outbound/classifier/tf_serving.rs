use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use super::labels::Labels;
use super::preprocess::to_input_tensor;
use super::preprocess::top_k;
use super::preprocess::InputTensor;
use crate::config::ClassifierConfig;
use crate::domain::classification::errors::ClassifierError;
use crate::domain::classification::models::Prediction;
use crate::domain::classification::ports::ImageClassifier;

/// Classifier backed by a TensorFlow-Serving compatible REST endpoint.
///
/// Decoding and normalization happen locally; only the input tensor crosses
/// the wire, and the raw probability vector comes back.
pub struct TfServingClassifier {
    client: reqwest::Client,
    predict_url: String,
    labels: Labels,
    top_k: usize,
    input_size: u32,
}

#[derive(Serialize)]
struct PredictRequest {
    instances: Vec<InputTensor>,
}

#[derive(Deserialize)]
struct PredictResponse {
    predictions: Vec<Vec<f64>>,
}

impl TfServingClassifier {
    /// # Errors
    /// * `Inference` - HTTP client could not be built
    pub fn new(config: &ClassifierConfig, labels: Labels) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        Ok(Self {
            client,
            predict_url: format!(
                "{}/v1/models/{}:predict",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            labels,
            top_k: config.top_k,
            input_size: config.input_size,
        })
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }
}

#[async_trait]
impl ImageClassifier for TfServingClassifier {
    async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>, ClassifierError> {
        let bytes = image.to_vec();
        let size = self.input_size;

        // Decoding and resizing are CPU bound
        let tensor = tokio::task::spawn_blocking(move || to_input_tensor(&bytes, size))
            .await
            .map_err(|e| ClassifierError::Inference(e.to_string()))??;

        let response = self
            .client
            .post(&self.predict_url)
            .json(&PredictRequest {
                instances: vec![tensor],
            })
            .send()
            .await
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %self.predict_url, status = status.as_u16(), "Model server rejected request");
            return Err(ClassifierError::Inference(format!(
                "model server returned {status}"
            )));
        }

        let body: PredictResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let probabilities = body
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| ClassifierError::Inference("empty predictions".to_string()))?;

        Ok(top_k(&probabilities, self.top_k, &self.labels))
    }
}
