//! Instruction template for the leaf disease analysis call.

/// Build the analysis instruction sent alongside the image.
///
/// The model is told to gate on whether the photo shows a plant leaf at
/// all, and to answer with a single flat JSON object matching the
/// [`AnalysisResult`](super::types::AnalysisResult) field set. The reply
/// is still treated as untrusted by the parser.
pub fn build_analysis_prompt() -> String {
    r#"IMPORTANT: First determine if this image contains a plant leaf or other vegetation.

If the image does NOT contain a plant leaf (for example a person, animal, object, or an unreadable photo), respond with exactly:
{"disease_detected": false, "disease_type": "invalid_image", "severity": "unknown", "confidence": 0, "symptoms": [], "possible_causes": [], "treatment": []}

If the image DOES contain a plant leaf, analyze it for disease symptoms and respond with a single JSON object with these fields:
- "disease_detected": boolean, true only if disease symptoms are visible
- "disease_name": common name of the disease, or null if the leaf is healthy
- "disease_type": one of "Fungal", "Bacterial", "Viral", "Nutritional", "Pest", or "healthy"
- "severity": one of "None", "Low", "Medium", "High"
- "confidence": number from 0 to 100, your confidence in the assessment
- "symptoms": array of short strings describing visible symptoms
- "possible_causes": array of short strings listing likely causes
- "treatment": array of short strings with practical treatment steps

Respond with the JSON object only. No markdown formatting, no code blocks, no commentary."#
        .to_string()
}
