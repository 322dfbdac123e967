/// Returns the span between the first `[` and the last `]` of the model text.
///
/// Without such a span, markdown fences are stripped and the rest is returned
/// trimmed. Several separate arrays yield a span that is not valid JSON; the
/// parse error is reported by the caller.
pub fn extract_json_array(text: &str) -> String {
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if end > start {
            return text[start..=end].to_string();
        }
    }

    text.replace("```json", "").replace("```", "").trim().to_string()
}
