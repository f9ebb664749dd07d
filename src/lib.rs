//! leafscan: web service for AI-assisted plant leaf disease detection.
//!
//! Forwards an uploaded leaf photo to a hosted vision-language model,
//! normalizes the free-form reply into a typed [`AnalysisResult`], and
//! renders it in a browser UI.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod server;

pub use analyzer::AnalysisResult;
pub use config::AppConfig;
pub use error::AnalysisError;
