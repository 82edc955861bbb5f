use async_trait::async_trait;

use crate::domain::classification::errors::ClassifierError;
use crate::domain::classification::models::Prediction;

/// Pre-trained image classifier, treated as a black box.
#[async_trait]
pub trait ImageClassifier: Send + Sync + 'static {
    /// Classify raw image bytes.
    ///
    /// # Returns
    /// At most top-K predictions, highest probability first
    ///
    /// # Errors
    /// * `ImageDecode` - Bytes are not a decodable image
    /// * `Inference` - Model backend failed
    async fn classify(&self, image: &[u8]) -> Result<Vec<Prediction>, ClassifierError>;
}
