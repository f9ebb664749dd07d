//! Tolerant normalization of model replies into [`AnalysisResult`].
//!
//! The hosted model is prompted to answer with a single flat JSON object,
//! but the reply is untrusted: it may arrive fenced in markdown, wrapped
//! in prose, or with fields missing or mistyped. Strategy: strip fences,
//! try a direct parse, then fall back to extracting the first balanced
//! `{...}` substring. Every field has a typed default.

use serde_json::Value;
use tracing::{debug, warn};

use super::types::{now_timestamp, AnalysisResult, UNKNOWN};
use crate::error::AnalysisError;

/// Parse raw model output into an [`AnalysisResult`].
///
/// # Errors
/// `AnalysisError::Parse` when no JSON object can be recovered from the
/// reply; the raw text is carried for diagnostics.
pub fn parse_analysis_response(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_markdown_fences(raw);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(v) if v.is_object() => v,
        direct => {
            let reason = match direct {
                Ok(_) => "reply is valid JSON but not an object".to_string(),
                Err(e) => e.to_string(),
            };
            debug!("Direct parse failed ({}), trying object extraction", reason);
            extract_and_parse(raw).ok_or_else(|| {
                warn!(
                    "Could not parse model reply as JSON: {}",
                    truncate(raw, 200)
                );
                AnalysisError::Parse {
                    reason,
                    raw: raw.to_string(),
                }
            })?
        }
    };

    Ok(map_fields(&value))
}

/// Strip surrounding markdown code fences (```json ... ``` or ``` ... ```).
fn strip_markdown_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    // Drop the opening fence line (with optional language tag)
    let after_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed.trim_start_matches('`'),
    };

    let cleaned = after_open.trim_end();
    if let Some(body) = cleaned.strip_suffix("```") {
        body.trim().to_string()
    } else {
        cleaned.trim().to_string()
    }
}

/// Find the first balanced `{...}` substring and parse it as a JSON object.
///
/// Brace matching is aware of JSON string literals and escapes, so braces
/// inside quoted values do not confuse the scan.
fn extract_and_parse(text: &str) -> Option<Value> {
    let candidate = find_balanced_object(text)?;
    match serde_json::from_str::<Value>(candidate) {
        Ok(v) if v.is_object() => {
            debug!("Recovered JSON object embedded in prose reply");
            Some(v)
        }
        _ => None,
    }
}

fn find_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    for start in 0..bytes.len() {
        if bytes[start] != b'{' {
            continue;
        }
        if let Some(end) = balanced_end(bytes, start) {
            return Some(&text[start..=end]);
        }
    }
    None
}

/// Index of the `}` closing the object opened at `start`, if balanced.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Map a parsed JSON object onto the result record, applying defaults.
fn map_fields(value: &Value) -> AnalysisResult {
    AnalysisResult {
        disease_detected: value["disease_detected"].as_bool().unwrap_or(false),
        disease_name: value["disease_name"].as_str().map(str::to_string),
        disease_type: string_field(value, "disease_type"),
        severity: string_field(value, "severity"),
        confidence: number_field(&value["confidence"]),
        symptoms: list_field(&value["symptoms"]),
        possible_causes: list_field(&value["possible_causes"]),
        treatment: list_field(&value["treatment"]),
        analysis_timestamp: value["analysis_timestamp"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(now_timestamp),
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value[key]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Accept a JSON number or a numeric string; anything else is 0.
fn number_field(value: &Value) -> f32 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        Value::String(s) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Accept an array; string items pass through, other scalars stringify.
fn list_field(value: &Value) -> Vec<String> {
    match value.as_array() {
        Some(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        None => Vec::new(),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_REPLY: &str = r#"{
        "disease_detected": true,
        "disease_name": "Brown Spot",
        "disease_type": "Fungal",
        "severity": "Medium",
        "confidence": 92.5,
        "symptoms": ["Brown spots on leaves", "Yellowing of leaves"],
        "possible_causes": ["Fungal infection", "High humidity"],
        "treatment": ["Use fungicide spray", "Remove infected leaves"]
    }"#;

    #[test]
    fn test_well_formed_reply_reproduced_exactly() {
        let result = parse_analysis_response(FULL_REPLY).unwrap();
        assert!(result.disease_detected);
        assert_eq!(result.disease_name.as_deref(), Some("Brown Spot"));
        assert_eq!(result.disease_type, "Fungal");
        assert_eq!(result.severity, "Medium");
        assert_eq!(result.confidence, 92.5);
        assert_eq!(
            result.symptoms,
            vec!["Brown spots on leaves", "Yellowing of leaves"]
        );
        assert_eq!(result.possible_causes.len(), 2);
        assert_eq!(result.treatment.len(), 2);
    }

    #[test]
    fn test_fenced_reply_parses_identically() {
        let fenced = format!("```json\n{}\n```", FULL_REPLY);
        let plain = parse_analysis_response(FULL_REPLY).unwrap();
        let stripped = parse_analysis_response(&fenced).unwrap();
        assert_eq!(stripped.disease_name, plain.disease_name);
        assert_eq!(stripped.confidence, plain.confidence);
        assert_eq!(stripped.symptoms, plain.symptoms);
    }

    #[test]
    fn test_bare_fence_without_language_tag() {
        let fenced = format!("```\n{}\n```", FULL_REPLY);
        let result = parse_analysis_response(&fenced).unwrap();
        assert_eq!(result.disease_type, "Fungal");
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let reply = format!(
            "Here is my analysis of the leaf:\n\n{}\n\nLet me know if you need more detail.",
            FULL_REPLY
        );
        let result = parse_analysis_response(&reply).unwrap();
        assert!(result.disease_detected);
        assert_eq!(result.disease_name.as_deref(), Some("Brown Spot"));
    }

    #[test]
    fn test_prose_with_stray_brace_after_object() {
        // A greedy first-{-to-last-} grab would swallow the trailing brace
        let reply = r#"Sure! {"disease_detected": false, "disease_type": "healthy"} (note: { means object)"#;
        let result = parse_analysis_response(reply).unwrap();
        assert!(!result.disease_detected);
        assert_eq!(result.disease_type, "healthy");
    }

    #[test]
    fn test_braces_inside_string_values() {
        let reply = r#"{"disease_detected": true, "disease_name": "Spot {rare}", "disease_type": "Fungal"}"#;
        let result = parse_analysis_response(reply).unwrap();
        assert_eq!(result.disease_name.as_deref(), Some("Spot {rare}"));
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let result = parse_analysis_response(r#"{"disease_detected": true}"#).unwrap();
        assert!(result.disease_detected);
        assert!(result.disease_name.is_none());
        assert_eq!(result.disease_type, "unknown");
        assert_eq!(result.severity, "unknown");
        assert_eq!(result.confidence, 0.0);
        assert!(result.symptoms.is_empty());
        assert!(result.possible_causes.is_empty());
        assert!(result.treatment.is_empty());
        assert!(!result.analysis_timestamp.is_empty());
    }

    #[test]
    fn test_mistyped_fields_coerce_to_defaults() {
        let reply = r#"{
            "disease_detected": "yes",
            "disease_type": 7,
            "confidence": {"value": 90},
            "symptoms": "not a list"
        }"#;
        let result = parse_analysis_response(reply).unwrap();
        assert!(!result.disease_detected);
        assert_eq!(result.disease_type, "unknown");
        assert_eq!(result.confidence, 0.0);
        assert!(result.symptoms.is_empty());
    }

    #[test]
    fn test_confidence_as_numeric_string() {
        let result = parse_analysis_response(r#"{"confidence": "92.5"}"#).unwrap();
        assert_eq!(result.confidence, 92.5);

        let result = parse_analysis_response(r#"{"confidence": "88%"}"#).unwrap();
        assert_eq!(result.confidence, 88.0);
    }

    #[test]
    fn test_list_items_stringified() {
        let reply = r#"{"symptoms": ["spots", 3, true, null, {"nested": 1}]}"#;
        let result = parse_analysis_response(reply).unwrap();
        assert_eq!(result.symptoms, vec!["spots", "3", "true"]);
    }

    #[test]
    fn test_non_json_reply_is_parse_error() {
        let err = parse_analysis_response("I cannot analyze this image, sorry.").unwrap_err();
        match err {
            AnalysisError::Parse { raw, .. } => {
                assert!(raw.contains("cannot analyze"));
            }
            other => panic!("expected Parse error, got: {:?}", other),
        }
    }

    #[test]
    fn test_bare_scalar_reply_is_parse_error() {
        // Valid JSON, but not an object
        assert!(parse_analysis_response("42").is_err());
        assert!(parse_analysis_response("\"healthy\"").is_err());
    }

    #[test]
    fn test_unbalanced_object_is_parse_error() {
        let err = parse_analysis_response(r#"{"disease_detected": true"#).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));
    }

    #[test]
    fn test_first_unclosed_brace_does_not_mask_later_object() {
        let reply = r#"schema: { ...  actual: {"disease_type": "Viral", "disease_detected": true}"#;
        let result = parse_analysis_response(reply).unwrap();
        assert_eq!(result.disease_type, "Viral");
    }

    #[test]
    fn test_strip_markdown_fences_passthrough() {
        assert_eq!(strip_markdown_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_upstream_timestamp_honored() {
        let reply = r#"{"disease_detected": false, "analysis_timestamp": "2025-06-01 10:00:00"}"#;
        let result = parse_analysis_response(reply).unwrap();
        assert_eq!(result.analysis_timestamp, "2025-06-01 10:00:00");
    }
}
