//! Abstract reconstruction.
//!
//! OpenAlex ships abstracts as an inverted index (`word -> [positions]`) for
//! legal reasons. This module turns that back into plain text.

use serde_json::Value;

/// Rebuild the abstract text from an `abstract_inverted_index` value.
///
/// Every position of every word becomes one token; tokens are ordered by
/// position and joined with single spaces. Positions that are not
/// non-negative integers are ignored. Anything other than a JSON object
/// (including `null`) yields an empty string.
pub fn reconstruct_abstract(inverted_index: &Value) -> String {
    let Some(obj) = inverted_index.as_object() else {
        return String::new();
    };

    let mut words: Vec<(u64, &str)> = Vec::new();

    for (word, positions) in obj {
        if let Some(pos_array) = positions.as_array() {
            for pos in pos_array {
                if let Some(p) = pos.as_u64() {
                    words.push((p, word.as_str()));
                }
            }
        }
    }

    // stable: equal positions keep map traversal order
    words.sort_by_key(|(pos, _)| *pos);
    words.iter().map(|(_, w)| *w).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contiguous_positions() {
        let index = json!({
            "Despite": [0],
            "growing": [1],
            "interest": [2],
            "in": [3],
            "science": [4]
        });
        assert_eq!(
            reconstruct_abstract(&index),
            "Despite growing interest in science"
        );
    }

    #[test]
    fn test_repeated_words() {
        let index = json!({
            "the": [0, 4],
            "cat": [1],
            "sat": [2],
            "on": [3],
            "mat": [5]
        });
        assert_eq!(reconstruct_abstract(&index), "the cat sat on the mat");
    }

    #[test]
    fn test_gaps_are_collapsed() {
        let index = json!({ "first": [2], "second": [10] });
        assert_eq!(reconstruct_abstract(&index), "first second");
    }

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(reconstruct_abstract(&json!({})), "");
        assert_eq!(reconstruct_abstract(&Value::Null), "");
        assert_eq!(reconstruct_abstract(&json!("not an index")), "");
    }

    #[test]
    fn test_invalid_positions_ignored() {
        let index = json!({ "kept": [0], "dropped": [-1, "x"], "also": [1] });
        assert_eq!(reconstruct_abstract(&index), "kept also");
    }

    #[test]
    fn test_shared_position_keeps_document_order() {
        let index: Value =
            serde_json::from_str(r#"{"zeta": [0], "alpha": [0], "mid": [1]}"#).unwrap();
        assert_eq!(reconstruct_abstract(&index), "zeta alpha mid");
    }
}
