//! Document-scoped compressed identifier tables.
//!
//! A compiled document whose root is an array carries its referenced asset
//! identifiers as the second top-level element. Keyframe records and texture
//! hints index into this table by position.

use serde_json::Value;

/// Ordered, document-scoped table of opaque identifier strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierTable {
    ids: Vec<String>,
}

impl IdentifierTable {
    /// Build the table from a document root.
    ///
    /// The table is the document's second top-level element when the root is
    /// an array and that element is itself an array; non-string entries are
    /// skipped. Any other shape yields an empty table.
    pub fn from_document(doc: &Value) -> Self {
        let ids = match doc {
            Value::Array(items) => match items.get(1) {
                Some(Value::Array(entries)) => entries
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Self { ids }
    }

    /// Resolve an index to an identifier. Out-of-range indexes (including
    /// negative values that failed integer narrowing upstream) resolve to
    /// `None`; resolution never aborts the run.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// The first identifier in the table, if any.
    pub fn first(&self) -> Option<&str> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Guess the compressed texture reference backing a document's sprite frames.
///
/// This is the raw first entry of the top-level identifier array, required to
/// be a string. It is a heuristic join key: sprite-frame documents reference
/// exactly one texture, listed first.
pub fn guess_texture_reference(doc: &Value) -> Option<&str> {
    match doc {
        Value::Array(items) => match items.get(1) {
            Some(Value::Array(entries)) => entries.first().and_then(Value::as_str),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_from_second_top_level_element() {
        let doc = json!([1, ["aa11", "bb22", 7, "cc33"], {"x": 1}]);
        let table = IdentifierTable::from_document(&doc);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("aa11"));
        assert_eq!(table.get(2), Some("cc33"));
    }

    #[test]
    fn out_of_range_resolves_to_none() {
        let table = IdentifierTable::from_document(&json!([0, ["only"]]));
        assert_eq!(table.get(0), Some("only"));
        assert_eq!(table.get(1), None);
        assert_eq!(table.get(usize::MAX), None);
    }

    #[test]
    fn non_array_shapes_yield_empty_table() {
        assert!(IdentifierTable::from_document(&json!({"a": 1})).is_empty());
        assert!(IdentifierTable::from_document(&json!([1, "not-an-array"])).is_empty());
        assert!(IdentifierTable::from_document(&json!([])).is_empty());
    }

    #[test]
    fn texture_reference_requires_string_first_entry() {
        assert_eq!(
            guess_texture_reference(&json!([0, ["abcdef12", "x"]])),
            Some("abcdef12")
        );
        assert_eq!(guess_texture_reference(&json!([0, [42, "x"]])), None);
        assert_eq!(guess_texture_reference(&json!([0, []])), None);
        assert_eq!(guess_texture_reference(&json!({"a": 1})), None);
    }
}
