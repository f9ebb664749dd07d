//! Presentation adapter: view models and askama templates.
//!
//! The result card renders one of three cases (invalid image, disease
//! detected, healthy) from a normalized [`AnalysisResult`]. Pure display
//! branching, no state.

use askama::Template;

use crate::analyzer::AnalysisResult;

/// Full upload page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub model_name: String,
}

/// Result card fragment, injected into the page after analysis.
#[derive(Template)]
#[template(path = "partials/result_card.html")]
pub struct ResultCard {
    pub invalid_image: bool,
    pub disease_detected: bool,
    pub title: String,
    pub disease_type: String,
    pub severity: String,
    pub confidence_display: String,
    pub symptoms: Vec<String>,
    pub possible_causes: Vec<String>,
    pub treatment: Vec<String>,
    pub timestamp: String,
}

impl ResultCard {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let title = if result.is_invalid_image() {
            "Invalid Image".to_string()
        } else if result.disease_detected {
            result
                .disease_name
                .clone()
                .unwrap_or_else(|| "Unknown Disease".to_string())
        } else {
            "Healthy Leaf".to_string()
        };

        Self {
            invalid_image: result.is_invalid_image(),
            disease_detected: result.disease_detected,
            title,
            disease_type: result.disease_type.clone(),
            severity: result.severity.clone(),
            confidence_display: format!("{:.1}%", result.confidence),
            symptoms: result.symptoms.clone(),
            possible_causes: result.possible_causes.clone(),
            treatment: result.treatment.clone(),
            timestamp: result.analysis_timestamp.clone(),
        }
    }
}
