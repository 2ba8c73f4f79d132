//! Context assembly.
//!
//! Joins the retrieved chunk texts into the block handed to the prompt.
//! Order is exactly the order the index returned (similarity-descending);
//! nothing is re-ranked, deduplicated, or truncated.

use crate::vector::IndexMatch;

pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// The text a match contributes, if any. Missing or blank text counts as none.
pub(crate) fn context_text(m: &IndexMatch) -> Option<&str> {
    m.metadata
        .as_ref()
        .map(|metadata| metadata.text.as_str())
        .filter(|text| !text.trim().is_empty())
}

/// Matches stored without text metadata contribute nothing.
pub fn build_context(matches: &[IndexMatch]) -> String {
    matches
        .iter()
        .filter_map(context_text)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::RecordMetadata;

    fn hit(id: &str, score: f32, text: Option<&str>) -> IndexMatch {
        IndexMatch {
            id: id.to_string(),
            score,
            metadata: text.map(|t| RecordMetadata {
                text: t.to_string(),
                source: None,
            }),
        }
    }

    #[test]
    fn joins_texts_in_index_order_with_one_blank_line() {
        let matches = vec![
            hit("2", 0.9, Some("AFib is an irregular heart rhythm.")),
            hit("0", 0.7, Some("Beta blockers slow the heart rate.")),
            hit("1", 0.4, Some("Stroke risk is assessed with CHA2DS2-VASc.")),
        ];

        assert_eq!(
            build_context(&matches),
            "AFib is an irregular heart rhythm.\n\n\
             Beta blockers slow the heart rate.\n\n\
             Stroke risk is assessed with CHA2DS2-VASc."
        );
    }

    #[test]
    fn keeps_supplied_order_even_if_scores_disagree() {
        let matches = vec![hit("a", 0.1, Some("first")), hit("b", 0.9, Some("second"))];
        assert_eq!(build_context(&matches), "first\n\nsecond");
    }

    #[test]
    fn skips_matches_without_text() {
        let matches = vec![hit("a", 0.9, None), hit("b", 0.8, Some("only")), hit("c", 0.7, Some("  "))];
        assert_eq!(build_context(&matches), "only");
        assert_eq!(build_context(&[]), "");
    }
}
