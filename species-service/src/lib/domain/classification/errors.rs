use thiserror::Error;

/// Errors raised while classifying an uploaded image
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifierError {
    /// The bytes are not an image the decoder understands. Client fault.
    #[error("Could not decode image: {0}")]
    ImageDecode(String),

    /// The model server could not be reached or answered nonsense.
    #[error("Classification failed: {0}")]
    Inference(String),
}
