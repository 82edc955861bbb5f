use std::cmp::Ordering;

use image::imageops::FilterType;

use super::labels::Labels;
use crate::domain::classification::errors::ClassifierError;
use crate::domain::classification::models::Prediction;

/// Height x width x RGB, the layout the model server expects per instance.
pub type InputTensor = Vec<Vec<[f32; 3]>>;

/// Decode `bytes`, resize to `size`x`size` and scale channels to `[-1, 1]`.
///
/// Resizing is nearest-neighbour and ignores aspect ratio, matching how the
/// network was fed during training.
///
/// # Errors
/// * `ImageDecode` - Bytes are empty or not a supported image format
pub fn to_input_tensor(bytes: &[u8], size: u32) -> Result<InputTensor, ClassifierError> {
    if bytes.is_empty() {
        return Err(ClassifierError::ImageDecode("empty upload".to_string()));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|e| ClassifierError::ImageDecode(e.to_string()))?
        .resize_exact(size, size, FilterType::Nearest)
        .to_rgb8();

    Ok(image
        .rows()
        .map(|row| {
            row.map(|pixel| {
                let [r, g, b] = pixel.0;
                [scale(r), scale(g), scale(b)]
            })
            .collect()
        })
        .collect())
}

/// MobileNetV2 input scaling.
fn scale(channel: u8) -> f32 {
    f32::from(channel) / 127.5 - 1.0
}

/// Rank `probabilities` and keep the best `k`, highest first.
pub fn top_k(probabilities: &[f64], k: usize, labels: &Labels) -> Vec<Prediction> {
    let mut ranked: Vec<(usize, f64)> = probabilities
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, p)| !p.is_nan())
        .collect();

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    ranked
        .into_iter()
        .take(k)
        .map(|(index, probability)| Prediction::new(labels.name(index), probability))
        .collect()
}
