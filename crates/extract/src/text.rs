// ABOUTME: Pure text normalization helpers for extracted article bodies.
// ABOUTME: Whitespace collapsing, literal boilerplate-phrase stripping, and cutoff-marker truncation.

//! Text normalization for extracted body text.
//!
//! All functions here are pure and perform no I/O. The pipeline applies them
//! in order: phrases are stripped first, then the body is truncated at the
//! earliest cutoff marker, then whitespace is collapsed to erase the gaps the
//! stripping left behind.

/// Collapses runs of whitespace (including newlines) into single spaces and
/// trims the ends. Idempotent.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes the first literal occurrence of each phrase, in order.
///
/// Matching is plain substring search, not regex. Phrases that do not occur
/// are skipped; empty phrases are ignored.
pub fn strip_phrases(s: &str, phrases: &[String]) -> String {
    let mut out = s.to_string();
    for phrase in phrases {
        if phrase.is_empty() {
            continue;
        }
        if let Some(pos) = out.find(phrase.as_str()) {
            out.replace_range(pos..pos + phrase.len(), "");
        }
    }
    out
}

/// Truncates `s` before the earliest occurrence of any marker.
///
/// Scans for the smallest starting index among all markers present and
/// returns the trimmed prefix up to it. When no marker occurs the input is
/// returned unchanged, which makes the function idempotent.
pub fn truncate_at_first_marker(s: &str, markers: &[String]) -> String {
    let earliest = markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| s.find(m.as_str()))
        .min();
    match earliest {
        Some(idx) => s[..idx].trim().to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  hello   world  "), "hello world");
        assert_eq!(collapse_whitespace("no\textra\nspaces"), "no extra spaces");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_collapse_whitespace_is_idempotent() {
        let once = collapse_whitespace(" a \n b\t\tc ");
        assert_eq!(collapse_whitespace(&once), once);
    }

    #[test]
    fn test_strip_phrases_removes_first_occurrence() {
        let body = "Lead paragraph. Únete a nuestro canal. Trailing boilerplate.";
        let phrases = vec!["Únete a nuestro canal.".to_string()];
        let stripped = strip_phrases(body, &phrases);
        assert_eq!(stripped, "Lead paragraph.  Trailing boilerplate.");
        assert_eq!(
            collapse_whitespace(&stripped),
            "Lead paragraph. Trailing boilerplate."
        );
    }

    #[test]
    fn test_strip_phrases_leaves_unmatched_text_alone() {
        let phrases = vec!["(CNN) --".to_string(), "bmc/apr".to_string()];
        assert_eq!(strip_phrases("nothing to see", &phrases), "nothing to see");
    }

    #[test]
    fn test_strip_phrases_result_contains_no_phrase() {
        let phrases = vec![
            "(CNN Español) --".to_string(),
            "(CNN) --".to_string(),
        ];
        let out = strip_phrases("(CNN Español) -- La noticia. (CNN) -- más", &phrases);
        for phrase in &phrases {
            assert!(!out.contains(phrase.as_str()), "{:?} survived", phrase);
        }
    }

    #[test]
    fn test_strip_phrases_ignores_empty_phrase() {
        let phrases = vec![String::new()];
        assert_eq!(strip_phrases("unchanged", &phrases), "unchanged");
    }

    #[test]
    fn test_truncate_at_first_marker() {
        let body = "Real content here. Copyright © 2024 Example";
        let markers = vec!["Copyright ©".to_string()];
        assert_eq!(truncate_at_first_marker(body, &markers), "Real content here.");
    }

    #[test]
    fn test_truncate_picks_earliest_marker() {
        let body = "keep AAA drop BBB rest";
        let markers = vec!["BBB".to_string(), "AAA".to_string()];
        assert_eq!(truncate_at_first_marker(body, &markers), "keep");
    }

    #[test]
    fn test_truncate_without_marker_is_identity_and_idempotent() {
        let markers = vec!["Copyright ©".to_string()];
        let body = "no marker in sight";
        let once = truncate_at_first_marker(body, &markers);
        assert_eq!(once, body);
        assert_eq!(truncate_at_first_marker(&once, &markers), once);
    }

    #[test]
    fn test_truncate_result_is_strict_prefix() {
        let body = "prefix text marker tail";
        let markers = vec!["marker".to_string()];
        let out = truncate_at_first_marker(body, &markers);
        assert!(body.starts_with(&out));
        assert!(out.len() < body.find("marker").unwrap());
        assert!(!out.contains("marker"));
    }

    #[test]
    fn test_truncate_handles_multibyte_text() {
        let body = "Canción número uno. Apúntate aquí a esta newsletter";
        let markers = vec!["Apúntate aquí".to_string()];
        assert_eq!(truncate_at_first_marker(body, &markers), "Canción número uno.");
    }
}
