//! Resident-size estimation for cached values
//!
//! Estimates are deliberately cheap and approximate; they exist to keep the
//! cache's byte budget honest, not to measure real allocations.

/// Approximate resident size of a cached value, in bytes
pub trait EstimateSize {
    /// Estimated size in bytes
    fn estimate_size(&self) -> usize;
}

impl EstimateSize for String {
    fn estimate_size(&self) -> usize {
        // Two bytes per UTF-16 code unit
        self.encode_utf16().count() * 2
    }
}

impl EstimateSize for serde_json::Value {
    fn estimate_size(&self) -> usize {
        match self {
            serde_json::Value::String(s) => s.encode_utf16().count() * 2,
            serde_json::Value::Number(_) => 8,
            serde_json::Value::Bool(_) => 4,
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => estimate_json_size(self),
            serde_json::Value::Null => 64,
        }
    }
}

/// Estimate a value's size by the length of its JSON serialization
///
/// Falls back to 1024 bytes when serialization fails.
pub fn estimate_json_size<T: serde::Serialize>(value: &T) -> usize {
    serde_json::to_string(value).map_or(1024, |json| json.len() * 2)
}
