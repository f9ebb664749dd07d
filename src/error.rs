use thiserror::Error;

/// Errors surfaced by the analysis pipeline.
///
/// Policy is surface-to-caller: no retry, no partial recovery. The one
/// exception is an empty input image, which yields an `invalid_image`
/// result instead of an error.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Failed to parse model response: {reason}")]
    Parse {
        reason: String,
        /// Raw model reply, kept for diagnostics.
        raw: String,
    },
}

impl AnalysisError {
    /// The raw model reply for `Parse` errors, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            AnalysisError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_keeps_raw() {
        let err = AnalysisError::Parse {
            reason: "expected value".to_string(),
            raw: "the model said nothing useful".to_string(),
        };
        assert_eq!(err.raw_response(), Some("the model said nothing useful"));
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn test_non_parse_errors_have_no_raw() {
        let err = AnalysisError::InvalidInput("empty file".to_string());
        assert!(err.raw_response().is_none());
    }
}
