use std::sync::LazyLock;

use regex::Regex;

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]|\[note \d+\]|\[[a-z]\]").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip citation markers (`[1]`, `[note 2]`, `[a]`, `[b]`, ...) and collapse whitespace.
pub fn clean(text: &str) -> String {
    let stripped = CITATION_RE.replace_all(text, "");
    WS_RE.replace_all(&stripped, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_numeric_citations() {
        assert_eq!(clean("The end is near[1][23]"), "The end is near");
    }

    #[test]
    fn strips_note_and_letter_markers() {
        assert_eq!(clean("Harold Camping[note 4] said so[a]"), "Harold Camping said so");
    }

    #[test]
    fn strips_any_footnote_letter() {
        assert_eq!(clean("Harold Camping said so[b][c]"), "Harold Camping said so");
        assert_eq!(clean("Year [z] end"), "Year end");
    }

    #[test]
    fn keeps_other_brackets() {
        assert_eq!(
            clean("Year [B] and [ab] and [citation needed]"),
            "Year [B] and [ab] and [citation needed]"
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(clean("  many\n\tspaces   here  "), "many spaces here");
    }

    #[test]
    fn marker_between_words_leaves_single_space() {
        assert_eq!(clean("word [12] word"), "word word");
    }

    #[test]
    fn empty_input() {
        assert_eq!(clean("   "), "");
    }
}
