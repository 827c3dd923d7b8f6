//! Text normalization, cache keys, and result extraction

use std::sync::OnceLock;

use regex::Regex;

/// Strip whitespace, punctuation, and symbols
///
/// Two pastes of the same article that differ only in formatting normalize
/// to the same string and therefore share a cache entry.
pub fn normalize_text(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[\s\p{P}\p{S}]").expect("valid pattern"));
    re.replace_all(text, "").into_owned()
}

/// Cache key for one (article, mode, model) combination
pub fn analysis_cache_key(article_text: &str, mode: &str, model: &str) -> String {
    let digest = ink_cache::compute_cache_key(&normalize_text(article_text));
    format!("{digest}:{mode}:{model}")
}

/// A completion's extracted JSON payload
#[derive(Debug, Clone)]
pub struct ExtractedResult {
    /// The JSON text stored as the canonical result
    pub json_text: String,
    /// Parsed value, or `{"raw": <content>}` when nothing parsed
    pub parsed: serde_json::Value,
    /// `overallScore` when the result parsed cleanly
    pub overall_score: Option<f64>,
}

/// Pull the result JSON out of a completion
///
/// Tries a fenced ```` ```json ```` block first, then the outermost JSON
/// object in the text, then falls back to wrapping the raw content.
pub fn extract_result(content: &str) -> ExtractedResult {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    static OBJECT: OnceLock<Regex> = OnceLock::new();

    let fenced = FENCED.get_or_init(|| {
        Regex::new(r"```json\s*([\s\S]+?)\s*```").expect("valid pattern")
    });
    let object = OBJECT.get_or_init(|| Regex::new(r"\{[\s\S]+\}").expect("valid pattern"));

    let json_text = fenced
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .or_else(|| object.find(content).map(|m| m.as_str().trim()))
        .unwrap_or(content);

    match serde_json::from_str::<serde_json::Value>(json_text) {
        Ok(parsed) => {
            let overall_score = parsed.get("overallScore").and_then(serde_json::Value::as_f64);
            ExtractedResult {
                json_text: json_text.to_owned(),
                parsed,
                overall_score,
            }
        }
        Err(_) => ExtractedResult {
            json_text: json_text.to_owned(),
            parsed: serde_json::json!({ "raw": content }),
            overall_score: None,
        },
    }
}

/// Split `text` into slices of at most `max_bytes`, never inside a UTF-8
/// sequence
pub fn utf8_slices(text: &str, max_bytes: usize) -> Vec<&str> {
    let mut slices = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let mut end = max_bytes.min(rest.len());
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // A single char wider than the slice budget still ships whole
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        let (head, tail) = rest.split_at(end);
        slices.push(head);
        rest = tail;
    }

    slices
}
