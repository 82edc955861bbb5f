pub mod labels;
pub mod preprocess;
pub mod tf_serving;

pub use labels::Labels;
pub use tf_serving::TfServingClassifier;
