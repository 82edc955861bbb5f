pub mod classification;
pub mod user;
