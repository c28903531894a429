use std::sync::LazyLock;

use regex::Regex;

// OCR output scrambles duration phrases in a few recurring ways;
// all three variants collapse to the canonical "N days".
static RE_FOR_DAYS_N: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)for[ \t]+days[ \t]+(\d+)").unwrap());
static RE_DAYS_FOR_N: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)days[ \t]+for[ \t]+(\d+)").unwrap());
static RE_FOR_N_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)for[ \t]+(\d+)[ \t]+days").unwrap());

// A 3-part frequency with a dangling trailing dash ("1-0-1-") is a
// truncated 4-part pattern; pad the missing night slot with 0. A bare
// 3-part pattern ("1-0-1") is left alone — it is already meaningful.
static RE_FREQ_TRAILING_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)-(\d+)-($|[^\d])").unwrap());

// Glued tokens: "5days" → "5 days", "2for" → "2 for".
static RE_GLUED_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)days").unwrap());
static RE_GLUED_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)for\b").unwrap());

static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Clean known OCR artifacts out of raw prescription text.
///
/// Deterministic and total: always returns a string, possibly unchanged.
/// Newlines are preserved — the extractor's fallback pass works on
/// individual lines, so whitespace is only collapsed within a line.
pub fn normalize_ocr_text(raw: &str) -> String {
    let text = RE_FOR_DAYS_N.replace_all(raw, "$1 days");
    let text = RE_DAYS_FOR_N.replace_all(&text, "$1 days");
    let text = RE_FOR_N_DAYS.replace_all(&text, "$1 days");
    let text = RE_FREQ_TRAILING_DASH.replace_all(&text, "${1}-${2}-${3}-0${4}");
    let text = RE_GLUED_DAYS.replace_all(&text, "$1 days");
    let text = RE_GLUED_FOR.replace_all(&text, "$1 for");
    let text = RE_SPACES.replace_all(&text, " ");

    text.lines().map(str::trim).collect::<Vec<_>>().join("\n").trim().to_string()
}
