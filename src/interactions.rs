//! Drug-drug interaction checking.
//!
//! A pair is only reported when the static table knows it AND the two
//! medicines actually share a dosing slot — pharmacologically interacting
//! drugs that never co-occur in the same time of day are not flagged.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{DetectedInteraction, DoseSlot, Medicine, SlotOverlap};
use crate::reference::ReferenceData;

// Longest alternatives first: "tablet" must not lose its tail to "tab".
static RE_FORM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:tablet|capsule|tab|cap)\s*").unwrap());

/// Strip a leading dose-form prefix ("Tab ", "Capsule ") and lowercase.
pub fn normalize_medicine_name(name: &str) -> String {
    RE_FORM_PREFIX.replace(name.trim(), "").to_lowercase()
}

/// Parse a frequency string into per-slot dose counts
/// (Morning, Afternoon, Evening, Night).
///
/// "Stat" is an immediate dose, recorded in the morning slot. Anything
/// empty or unparsable yields all zeros; short dash patterns are padded
/// with zeros on the right.
pub fn parse_frequency(freq: &str) -> [u32; 4] {
    let freq = freq.trim();
    if freq.is_empty() {
        return [0; 4];
    }
    if freq.eq_ignore_ascii_case("stat") {
        return [1, 0, 0, 0];
    }

    let mut slots = [0u32; 4];
    for (i, part) in freq.split('-').take(4).enumerate() {
        slots[i] = part.trim().parse().unwrap_or(0);
    }
    slots
}

fn has_overlap(f1: &[u32; 4], f2: &[u32; 4]) -> bool {
    (0..4).any(|i| f1[i] > 0 && f2[i] > 0)
}

/// Check every unordered pair of extracted medicines against the static
/// interaction table, confirming dose-time overlap before reporting.
///
/// Output order follows input iteration order (i, j) ascending, so the
/// result is deterministic for a given medicine list.
pub fn check_interactions(
    medicines: &[Medicine],
    reference: &ReferenceData,
) -> Vec<DetectedInteraction> {
    let mut detected = Vec::new();

    for i in 0..medicines.len() {
        for j in (i + 1)..medicines.len() {
            let Some(entry) = reference.find_interaction(&medicines[i].name, &medicines[j].name)
            else {
                continue;
            };

            let f1 = parse_frequency(&medicines[i].frequency);
            let f2 = parse_frequency(&medicines[j].frequency);
            if !has_overlap(&f1, &f2) {
                continue;
            }

            detected.push(DetectedInteraction {
                med1: entry.med1.clone(),
                med2: entry.med2.clone(),
                severity: entry.severity,
                note: entry.note.clone(),
                overlap_times: DoseSlot::ALL
                    .iter()
                    .map(|slot| SlotOverlap {
                        time: *slot,
                        conflict: f1[slot.index()] > 0 && f2[slot.index()] > 0,
                    })
                    .collect(),
            });
        }
    }

    detected
}
