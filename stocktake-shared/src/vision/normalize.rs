//! Vision response normalizer
//!
//! Vision models are asked for a JSON array of `{label, count, confidence?}`
//! objects but often wrap it in prose or code fences, quote numbers, or
//! repeat labels. [`normalize_detections`] extracts the array and turns it
//! into clean [`DetectedItem`]s.
//!
//! # Example
//!
//! ```
//! use stocktake_shared::vision::normalize::normalize_detections;
//!
//! let raw = r#"Here you go: [{"label":"Shirt","count":2},{"label":"shirt","count":"3"}]"#;
//! let items = normalize_detections(raw).unwrap();
//!
//! assert_eq!(items.len(), 1);
//! assert_eq!(items[0].label, "shirt");
//! assert_eq!(items[0].count, 5);
//! ```

use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::models::detected_item::DetectedItem;

/// Maximum number of characters of the raw text kept in errors
pub const SNIPPET_LENGTH: usize = 200;

/// Normalization errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    /// No `[ ... ]` span in the text
    #[error("No JSON array found in model response: {snippet}")]
    NoJsonArray { snippet: String },

    /// The bracketed span isn't valid JSON
    #[error("Invalid JSON in model response ({message}): {snippet}")]
    InvalidJson { snippet: String, message: String },

    /// Valid JSON, but not an array
    #[error("Model response is not a JSON array: {snippet}")]
    NotAnArray { snippet: String },
}

fn snippet(text: &str) -> String {
    text.chars().take(SNIPPET_LENGTH).collect()
}

fn parse_array(raw: &str) -> Result<Vec<Value>, NormalizeError> {
    let value = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => value,
        Err(_) => {
            let span = match (raw.find('['), raw.rfind(']')) {
                (Some(start), Some(end)) if start < end => &raw[start..=end],
                _ => {
                    return Err(NormalizeError::NoJsonArray {
                        snippet: snippet(raw),
                    })
                }
            };

            serde_json::from_str::<Value>(span).map_err(|e| NormalizeError::InvalidJson {
                snippet: snippet(span),
                message: e.to_string(),
            })?
        }
    };

    match value {
        Value::Array(elements) => Ok(elements),
        _ => Err(NormalizeError::NotAnArray {
            snippet: snippet(raw),
        }),
    }
}

/// Reads a number given either as a JSON number or a numeric string
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    number.is_finite().then_some(number)
}

fn parse_element(element: &Value) -> Option<DetectedItem> {
    let object = element.as_object()?;

    let label = object.get("label")?.as_str()?.trim();
    if label.is_empty() {
        return None;
    }

    let count = as_number(object.get("count")?)?;
    if count < 1.0 {
        return None;
    }
    // Float-to-int casts saturate at u32::MAX
    let count = count.floor() as u32;

    let item = DetectedItem::new(label.to_lowercase(), count);
    match object.get("confidence").and_then(as_number) {
        Some(confidence) => Some(item.with_confidence(confidence.clamp(0.0, 1.0))),
        None => Some(item),
    }
}

/// Parses raw model output into merged detections
///
/// Elements without a usable label or with a count below 1 are skipped.
/// Labels are lower-cased and duplicates merged by summing counts; the
/// first occurrence keeps its position and confidence.
///
/// # Errors
///
/// Fails when the text holds no parseable JSON array.
pub fn normalize_detections(raw: &str) -> Result<Vec<DetectedItem>, NormalizeError> {
    let elements = parse_array(raw)?;

    let mut items: Vec<DetectedItem> = Vec::with_capacity(elements.len());
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, element) in elements.iter().enumerate() {
        let Some(item) = parse_element(element) else {
            debug!(index, element = %element, "Skipping invalid detection");
            continue;
        };

        match positions.get(&item.label) {
            Some(&position) => {
                let existing = &mut items[position];
                existing.count = existing.count.saturating_add(item.count);
            }
            None => {
                positions.insert(item.label.clone(), items.len());
                items.push(item);
            }
        }
    }

    debug!(
        elements = elements.len(),
        items = items.len(),
        "Normalized vision response"
    );
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_case_insensitive_labels() {
        let items =
            normalize_detections(r#"[{"label":"Shirt","count":2},{"label":"shirt","count":"3"}]"#)
                .unwrap();
        assert_eq!(items, vec![DetectedItem::new("shirt", 5)]);
    }

    #[test]
    fn test_extracts_array_from_prose() {
        let raw = "```json\n[{\"label\": \"Tomato\", \"count\": 4, \"confidence\": 0.9}]\n```";
        let items = normalize_detections(raw).unwrap();
        assert_eq!(items, vec![DetectedItem::new("tomato", 4).with_confidence(0.9)]);
    }

    #[test]
    fn test_no_array_is_error() {
        let err = normalize_detections("I could not see any items.").unwrap_err();
        assert!(matches!(err, NormalizeError::NoJsonArray { .. }));

        let err = normalize_detections("] backwards [").unwrap_err();
        assert!(matches!(err, NormalizeError::NoJsonArray { .. }));
    }

    #[test]
    fn test_invalid_json_in_brackets() {
        let err = normalize_detections("items: [label: shirt]").unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidJson { .. }));
    }

    #[test]
    fn test_object_is_not_an_array() {
        let err = normalize_detections(r#"{"label":"shirt","count":1}"#).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnArray { .. }));
    }

    #[test]
    fn test_drops_invalid_elements() {
        let raw = r#"[
            {"label":"cup","count":0},
            {"count":3},
            {"label":"   ","count":2},
            {"label":"plate","count":"many"},
            "fork",
            {"label":"Bowl","count":2.7}
        ]"#;
        let items = normalize_detections(raw).unwrap();
        assert_eq!(items, vec![DetectedItem::new("bowl", 2)]);
    }

    #[test]
    fn test_empty_array() {
        assert!(normalize_detections("[]").unwrap().is_empty());
    }

    #[test]
    fn test_confidence_clamped_or_dropped() {
        let raw = r#"[
            {"label":"a","count":1,"confidence":1.7},
            {"label":"b","count":1,"confidence":-0.2},
            {"label":"c","count":1,"confidence":"0.25"},
            {"label":"d","count":1,"confidence":"high"}
        ]"#;
        let items = normalize_detections(raw).unwrap();

        assert_eq!(items[0].confidence, Some(1.0));
        assert_eq!(items[1].confidence, Some(0.0));
        assert_eq!(items[2].confidence, Some(0.25));
        assert_eq!(items[3].confidence, None);
    }

    #[test]
    fn test_merge_keeps_first_order_and_confidence() {
        let raw = r#"[
            {"label":"Apple","count":1,"confidence":0.5},
            {"label":"pear","count":2},
            {"label":"APPLE","count":3,"confidence":0.9}
        ]"#;
        let items = normalize_detections(raw).unwrap();

        assert_eq!(
            items,
            vec![
                DetectedItem::new("apple", 4).with_confidence(0.5),
                DetectedItem::new("pear", 2),
            ]
        );
    }

    #[test]
    fn test_count_sum_saturates() {
        let raw = r#"[{"label":"bolt","count":4294967295},{"label":"bolt","count":10}]"#;
        let items = normalize_detections(raw).unwrap();
        assert_eq!(items[0].count, u32::MAX);
    }

    #[test]
    fn test_error_snippet_is_truncated() {
        let raw = "x".repeat(500);
        match normalize_detections(&raw).unwrap_err() {
            NormalizeError::NoJsonArray { snippet } => assert_eq!(snippet.len(), SNIPPET_LENGTH),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
