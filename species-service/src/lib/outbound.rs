pub mod classifier;
pub mod repositories;
