//! Plain-text rendering of interviewer utterances for text-to-speech.

use regex::Regex;
use std::sync::LazyLock;

static LABELS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(\*\*)?(Question|Type|Topic):(\*\*)?[ \t]*").expect("static label pattern")
});
static ASIDES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("static aside pattern"));
static LIST_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d+[.)]|[-•→◦])[ \t]*").expect("static list pattern")
});
static MARKDOWN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*#`_~{}|\\]").expect("static markdown pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));
static LEADING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[,.\s]+").expect("static leading pattern"));
static TRAILING_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.\s]+$").expect("static trailing pattern"));

/// Turns an interviewer utterance into plain text suitable for speaking aloud.
///
/// Drops markdown, `Question:`-style labels, bracketed or parenthetical
/// asides and list markers, then collapses whitespace. Punctuation left
/// dangling by a removed aside is folded into a single closing period.
pub fn clean_for_speech(text: &str) -> String {
    let text = LABELS.replace_all(text, "");
    let text = ASIDES.replace_all(&text, "");
    let text = LIST_MARKERS.replace_all(&text, "");
    let text = MARKDOWN.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = LEADING_PUNCTUATION.replace(text.trim(), "");
    TRAILING_PUNCTUATION.replace(&text, ".").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_markdown_and_labels() {
        let raw = "**Question:** How would you *scale* a `cache`? (take your time)";
        assert_eq!(clean_for_speech(raw), "How would you scale a cache?");
    }

    #[test]
    fn test_clean_lists_and_asides() {
        let raw = "1. First point [note]\n- Second point\n\n  2) Third";
        assert_eq!(clean_for_speech(raw), "First point Second point Third");
    }

    #[test]
    fn test_dangling_punctuation_after_aside() {
        assert_eq!(
            clean_for_speech("Explain `Arc<T>` (atomic refcount)."),
            "Explain Arc<T>."
        );
        assert_eq!(clean_for_speech(", then what happens [pause] ..."), "then what happens.");
        assert_eq!(clean_for_speech("(aside only)"), "");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let raw = "Could you elaborate more on your approach?";
        assert_eq!(clean_for_speech(raw), raw);
    }
}
