//! Reply cleanup applied to raw assistant output before it reaches users.
//!
//! Assistants backed by file search sprinkle their answers with citation
//! markup (`[1]`, `【4:0†source】`, `:source:`), private-use glyphs that
//! delimit those citations, and bare reference numbers. None of it is meant
//! for the end user, so it is stripped and the remaining whitespace is
//! tidied up. This is cosmetic, best-effort cleanup: if a removal leaves
//! dangling punctuation or nothing at all, that is what is returned.
//!
//! Removals run before whitespace handling because each removal can leave
//! a double space behind.

use std::sync::LazyLock;

use regex::Regex;

/// `[ ... ]`, non-greedy and without nesting: the span ends at the first `]`.
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket pattern"));

/// `【4:0†source】` style citations.
static LENTICULAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"【[^】]*】").expect("lenticular pattern"));

/// Text enclosed between two private-use marker glyphs on the same line.
static MARKER_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Co}[^\p{Co}\n]*\p{Co}").expect("marker span pattern"));

/// Leftover marker glyphs: private-use, invisible format characters (except
/// the zero-width joiner that glues emoji together), stray lenticular
/// brackets and control characters other than tab and line breaks.
static STRAY_GLYPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Co}【】]|[\p{Cf}&&[^\u{200D}]]|[\p{Cc}&&[^\t\n\r]]").expect("glyph pattern")
});

/// `:source:`, `:ref:`, `:footnote:` and friends.
static CITATION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i):\w+:").expect("token pattern"));

/// A number that forms a whole word on its own (`12`, not `12th` or `room12`).
static STANDALONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("number pattern"));

static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?])").expect("punctuation pattern"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern"));

/// Clean raw assistant text for display. Absent or empty input yields `""`.
///
/// ```
/// use yarnhub_assistant::normalize;
///
/// assert_eq!(normalize("The cat [1] sat ."), "The cat sat.");
/// assert_eq!(normalize(None), "");
/// ```
pub fn normalize<'a>(text: impl Into<Option<&'a str>>) -> String {
    let text = match text.into() {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    let text = BRACKETED.replace_all(text, "");
    let text = LENTICULAR.replace_all(&text, "");
    let text = MARKER_SPAN.replace_all(&text, "");
    let text = STRAY_GLYPH.replace_all(&text, "");
    let text = strip_citation_tokens(&text);
    let text = STANDALONE_NUMBER.replace_all(&text, "");
    let text = SPACE_BEFORE_PUNCT.replace_all(&text, "$1");
    let text = WHITESPACE_RUN.replace_all(&text, " ");

    text.trim().to_string()
}

/// Removing `:b:` from `a::b:c:` joins the colons around it into `:c:`, so
/// repeat until nothing matches.
fn strip_citation_tokens(text: &str) -> String {
    let mut text = text.to_string();
    while CITATION_TOKEN.is_match(&text) {
        text = CITATION_TOKEN.replace_all(&text, "").into_owned();
    }
    text
}
