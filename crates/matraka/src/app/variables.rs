//! Variable extraction and substitution over raw macro text.
//!
//! Both sides use the same `[input:...]` pattern directly on the raw text, so
//! extraction and substitution can never disagree about which spans are
//! variables. Name identity is case-sensitive after trimming; the `input`
//! keyword itself is not.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static INPUT_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[input:([^\[\]]+)\]").expect("input tag pattern"));

/// Names of every `[input:...]` variable in first-occurrence order, trimmed,
/// duplicates removed.
pub fn extract_variables(raw_text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in INPUT_TAG.captures_iter(raw_text) {
        let name = caps[1].trim();
        if name.is_empty() {
            continue;
        }
        if !names.iter().any(|known| known == name) {
            names.push(name.to_owned());
        }
    }
    names
}

/// Replace every `[input:<Name>]` occurrence with its bound value, leaving all
/// other tag kinds untouched. Names missing from `bindings` keep their
/// original tag text; [`extract_variables`] guarantees callers can cover every
/// name, so that case only arises for deliberately partial bindings.
pub fn substitute(raw_text: &str, bindings: &HashMap<String, String>) -> String {
    INPUT_TAG
        .replace_all(raw_text, |caps: &Captures<'_>| {
            match bindings.get(caps[1].trim()) {
                Some(value) => value.clone(),
                None => caps[0].to_owned(),
            }
        })
        .into_owned()
}

/// Decode HTML entities left over from a round-trip through a rich-text
/// field. Plain text passes through unchanged.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn extraction_keeps_first_occurrence_order_without_duplicates() {
        assert_eq!(
            extract_variables("[input:B] hi [input:A] [input:B]"),
            vec!["B", "A"]
        );
    }

    #[test]
    fn extraction_trims_names_and_ignores_empty_ones() {
        assert_eq!(
            extract_variables("[input: Name ] and [input:   ]"),
            vec!["Name"]
        );
    }

    #[test]
    fn extraction_returns_nothing_for_malformed_text() {
        assert!(extract_variables("text [input:Open without close").is_empty());
        assert!(extract_variables("").is_empty());
    }

    #[test]
    fn extraction_is_case_sensitive_on_names() {
        assert_eq!(
            extract_variables("[input:name] [input:Name]"),
            vec!["name", "Name"]
        );
    }

    #[test]
    fn substitution_replaces_all_occurrences_of_each_name() {
        let raw = "Hello [input:Name], your code is [input:Code]. [key:enter][wait:3][input:Name] again.";
        let out = substitute(raw, &bindings(&[("Name", "Ana"), ("Code", "42")]));
        assert_eq!(out, "Hello Ana, your code is 42. [key:enter][wait:3]Ana again.");
    }

    #[test]
    fn substitution_never_touches_other_tags() {
        let raw = "[cursor][wait:5]{selection}[dom:.x][input:V][agente]";
        let out = substitute(raw, &bindings(&[("V", "value")]));
        assert_eq!(out, "[cursor][wait:5]{selection}[dom:.x]value[agente]");
    }

    #[test]
    fn substitution_matches_keyword_case_insensitively() {
        let out = substitute("[INPUT:Name]", &bindings(&[("Name", "Ana")]));
        assert_eq!(out, "Ana");
    }

    #[test]
    fn unbound_names_keep_their_tag_text() {
        let out = substitute("[input:Known] [input:Unknown]", &bindings(&[("Known", "yes")]));
        assert_eq!(out, "yes [input:Unknown]");
    }

    #[test]
    fn empty_string_values_erase_the_tag() {
        let out = substitute("a[input:V]b", &bindings(&[("V", "")]));
        assert_eq!(out, "ab");
    }

    #[test]
    fn entity_decoding_normalizes_escaped_text() {
        assert_eq!(decode_entities("caf&eacute; &amp; co"), "café & co");
        assert_eq!(decode_entities("untouched"), "untouched");
    }
}
