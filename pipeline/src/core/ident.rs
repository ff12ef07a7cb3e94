//! Stable document id derivation for generated items
//!
//! Precedence is an ordered list of named field extractors tried in
//! sequence; when none matches, a positional fallback id is used. Two
//! payloads that normalize to the same id merge into one document at the
//! sink, which is the documented collision policy.

use serde_json::Value;

/// Named extractor: pulls a candidate id source field from the payload
type Extractor = fn(&Value) -> Option<String>;

fn from_id_field(data: &Value) -> Option<String> {
    string_field(data, "id")
}

fn from_name_field(data: &Value) -> Option<String> {
    string_field(data, "name")
}

fn from_condition_field(data: &Value) -> Option<String> {
    string_field(data, "condition")
}

fn from_exercise_field(data: &Value) -> Option<String> {
    string_field(data, "exercise")
}

fn string_field(data: &Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extractors in precedence order
const EXTRACTORS: &[Extractor] = &[
    from_id_field,
    from_name_field,
    from_condition_field,
    from_exercise_field,
];

/// Normalize a raw id source: lowercase, whitespace runs become hyphens
pub fn normalize_id(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
}

/// Derive a stable document id for one generated item
///
/// Deterministic: the same payload and positional index always produce
/// the same id.
pub fn assign_id(data: &Value, index: usize) -> String {
    for extract in EXTRACTORS {
        if let Some(source) = extract(data) {
            return normalize_id(&source);
        }
    }
    format!("item-{}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_id_wins() {
        let data = json!({"id": "Deep Sleep", "name": "Something Else"});
        assert_eq!(assign_id(&data, 0), "deep-sleep");
    }

    #[test]
    fn test_name_used_when_id_absent() {
        let data = json!({"name": "Morning Stretch"});
        assert_eq!(assign_id(&data, 0), "morning-stretch");
    }

    #[test]
    fn test_domain_fields_in_precedence_order() {
        let condition = json!({"condition": "Lower Back Pain"});
        assert_eq!(assign_id(&condition, 0), "lower-back-pain");

        let exercise = json!({"exercise": "Cat Cow"});
        assert_eq!(assign_id(&exercise, 0), "cat-cow");

        // condition outranks exercise when both are present
        let both = json!({"condition": "Neck Strain", "exercise": "Chin Tuck"});
        assert_eq!(assign_id(&both, 0), "neck-strain");
    }

    #[test]
    fn test_positional_fallback() {
        let data = json!({"text": "no usable name field"});
        assert_eq!(assign_id(&data, 0), "item-1");
        assert_eq!(assign_id(&data, 6), "item-7");
    }

    #[test]
    fn test_empty_source_field_falls_through() {
        let data = json!({"id": "   ", "name": "Fallback Name"});
        assert_eq!(assign_id(&data, 0), "fallback-name");
    }

    #[test]
    fn test_normalization_collapses_whitespace() {
        assert_eq!(normalize_id("  Deep   Breathing \t Drill "), "deep-breathing-drill");
        assert_eq!(normalize_id("Yoga"), "yoga");
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let data = json!({"name": "Evening Wind Down"});
        let first = assign_id(&data, 3);
        let second = assign_id(&data, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_string_id_field_ignored() {
        let data = json!({"id": 42, "name": "Numeric Id"});
        assert_eq!(assign_id(&data, 0), "numeric-id");
    }
}
