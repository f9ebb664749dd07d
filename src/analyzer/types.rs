//! Type definitions for leaf disease analysis.
//!
//! The [`AnalysisResult`] record is the single value produced per request
//! and consumed once by the presentation layer. It serializes as a flat
//! keyed JSON record for API consumers.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// `disease_type` value marking a non-leaf or unusable upload.
pub const INVALID_IMAGE_TYPE: &str = "invalid_image";

/// Default for textual fields the model reply omits.
pub const UNKNOWN: &str = "unknown";

/// Normalized disease-detection record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Whether the model found disease symptoms.
    pub disease_detected: bool,
    /// Common name of the detected disease, if any.
    pub disease_name: Option<String>,
    /// Open vocabulary: "Fungal", "Bacterial", "Viral", "healthy",
    /// "invalid_image", "unknown", ...
    pub disease_type: String,
    /// Severity label as reported by the model ("Low", "Medium", ...).
    pub severity: String,
    /// Confidence percentage (0-100).
    pub confidence: f32,
    pub symptoms: Vec<String>,
    pub possible_causes: Vec<String>,
    pub treatment: Vec<String>,
    /// RFC 3339 timestamp stamped at normalization time.
    pub analysis_timestamp: String,
}

impl AnalysisResult {
    /// Result returned for uploads that carry no usable image data.
    pub fn invalid_image() -> Self {
        Self {
            disease_detected: false,
            disease_name: None,
            disease_type: INVALID_IMAGE_TYPE.to_string(),
            severity: UNKNOWN.to_string(),
            confidence: 0.0,
            symptoms: Vec::new(),
            possible_causes: Vec::new(),
            treatment: Vec::new(),
            analysis_timestamp: now_timestamp(),
        }
    }

    pub fn is_invalid_image(&self) -> bool {
        self.disease_type == INVALID_IMAGE_TYPE
    }
}

/// Local-offset RFC 3339 timestamp for `analysis_timestamp`.
pub fn now_timestamp() -> String {
    Local::now().to_rfc3339()
}
