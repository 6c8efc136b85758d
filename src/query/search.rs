use serde_json::Value;

use crate::record::{number_text, Fields};

/// Canonical form of a user-typed search term.
pub fn normalize(search: &str) -> String {
    search.trim().to_lowercase()
}

/// True when `needle` (already normalized) occurs in any string or number
/// field of the record. Booleans, nulls, arrays and objects are not searched.
pub fn matches<R: Fields + ?Sized>(record: &R, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record.values().any(|value| match value {
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => number_text(n).contains(needle),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn trimmed_and_case_insensitive() {
        let r = record(json!({"name": "bob smith"}));
        assert!(matches(&r, &normalize(" Bob ")));
        assert!(matches(&r, &normalize("SMITH")));
        assert!(!matches(&r, &normalize("alice")));
    }

    #[test]
    fn numbers_are_searched_by_their_text() {
        let r = record(json!({"id": 40213, "score": 7.5}));
        assert!(matches(&r, "021"));
        assert!(matches(&r, "7.5"));
    }

    #[test]
    fn non_primitive_fields_are_ignored() {
        let r = record(json!({
            "tags": ["vip"],
            "meta": {"owner": "vip"},
            "active": true,
            "note": null
        }));
        assert!(!matches(&r, "vip"));
        assert!(!matches(&r, "true"));
    }

    #[test]
    fn empty_needle_matches_everything() {
        let r = record(json!({}));
        assert!(matches(&r, &normalize("   ")));
    }
}
