use serde::Serialize;

/// Which of the exposed prediction endpoints a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionKind {
    Organism,
    Microbe,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Organism => "organism",
            PredictionKind::Microbe => "microbe",
        }
    }
}

/// One ranked label produced by the classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Always within `[0, 1]`
    pub probability: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f64) -> Self {
        Self {
            label: label.into(),
            probability: probability.clamp(0.0, 1.0),
        }
    }
}
