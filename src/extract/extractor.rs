use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize_ocr_text;
use crate::models::Medicine;
use crate::reference::ReferenceData;

/// Segments shorter than this carry no usable detail and are dropped.
const MIN_SEGMENT_LEN: usize = 6;

static RE_DOSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+\s*(?:mcg|mg|gm|g))").unwrap());
static RE_GRAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\d+\s*gm").unwrap());
static RE_FREQUENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+-\d+-\d+-\d+|\d+-\d+-\d+|\d+-\d+|stat)\b").unwrap()
});
static RE_DURATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*days").unwrap());

/// Extract structured medicines from raw prescription OCR text.
///
/// The text is segmented at dictionary/alias name matches (zero-width
/// boundaries — overlapping text is never consumed), each segment is
/// parsed for dosage/frequency/duration, and a second line-scoped pass
/// recovers names the segment boundaries missed. The returned list has
/// no duplicate canonical names; fields that could not be parsed are
/// empty strings, which callers must read as "unknown".
pub fn extract_medicines(raw_text: &str, reference: &ReferenceData) -> Vec<Medicine> {
    let text = normalize_ocr_text(raw_text);

    let Some(pattern) = reference.name_pattern() else {
        return Vec::new();
    };

    let matches: Vec<regex::Match<'_>> = pattern.find_iter(&text).collect();

    // Each segment is the matched name (alias already mapped to its
    // canonical form) plus the text up to the next name match.
    let mut segments: Vec<String> = Vec::new();
    let mut seen_segments = HashSet::new();
    for (i, m) in matches.iter().enumerate() {
        let tail_end = matches.get(i + 1).map(|n| n.start()).unwrap_or(text.len());
        let tail = text[m.end()..tail_end].trim();
        let canonical = reference.canonical_for_match(m.as_str());
        let segment = format!("{canonical} {tail}").trim().to_string();
        if segment.len() >= MIN_SEGMENT_LEN && seen_segments.insert(segment.clone()) {
            segments.push(segment);
        }
    }

    let mut medicines: Vec<Medicine> = Vec::new();
    let mut extracted: HashSet<String> = HashSet::new();

    for segment in &segments {
        // A name with no dosage anywhere near it is most likely a stray
        // mention, not a prescribed item — except "stat" orders, which
        // pair with a gram dose.
        if !has_dosage_evidence(segment) {
            continue;
        }

        let Some(name) = reference.resolve_segment(segment) else {
            continue;
        };
        if !extracted.insert(name.to_lowercase()) {
            continue;
        }

        medicines.push(parse_segment(name, segment));
    }

    // Fallback pass: names mentioned anywhere in the text (directly or
    // via an alias) that the segmentation missed, e.g. two medicines
    // glued together without a clear dosage boundary. Parsed from the
    // containing line alone.
    let lower_text = text.to_lowercase();
    for canonical in reference.canonical_names() {
        if extracted.contains(&canonical.to_lowercase()) {
            continue;
        }
        let Some(term) = reference
            .search_terms_for(canonical)
            .iter()
            .find(|t| lower_text.contains(t.as_str()))
        else {
            continue;
        };
        let Some(line) = text.lines().find(|l| l.to_lowercase().contains(term.as_str())) else {
            continue;
        };
        if !has_dosage_evidence(line) {
            continue;
        }
        extracted.insert(canonical.to_lowercase());
        medicines.push(parse_segment(canonical, line));
    }

    medicines
}

fn has_dosage_evidence(segment: &str) -> bool {
    RE_DOSAGE.is_match(segment)
        || (segment.to_lowercase().contains("stat") && RE_GRAM.is_match(segment))
}

fn parse_segment(name: &str, segment: &str) -> Medicine {
    let dosage = RE_DOSAGE
        .captures(segment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let frequency = RE_FREQUENCY
        .captures(segment)
        .and_then(|c| c.get(1))
        .map(|m| {
            let raw = m.as_str().trim();
            if raw.eq_ignore_ascii_case("stat") {
                "Stat".to_string()
            } else {
                raw.to_string()
            }
        })
        .unwrap_or_default();

    let duration = RE_DURATION
        .captures(segment)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|n| format!("{n} days"))
        .unwrap_or_default();

    Medicine { name: name.to_string(), dosage, frequency, duration }
}
