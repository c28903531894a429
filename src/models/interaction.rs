use serde::{Deserialize, Serialize};

use super::enums::{DoseSlot, Severity};

/// A row of the static drug-interaction reference table.
///
/// Lookup is symmetric: (med1, med2) and (med2, med1) are the same pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub med1: String,
    pub med2: String,
    pub severity: Severity,
    #[serde(default)]
    pub note: String,
}

/// Per-slot overlap flag attached to a detected interaction, so clients
/// can highlight which time of day is actually risky.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOverlap {
    pub time: DoseSlot,
    pub conflict: bool,
}

/// An interaction confirmed for a concrete prescription: the pair exists
/// in the reference table AND both medicines share at least one dosing
/// slot with a nonzero count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedInteraction {
    pub med1: String,
    pub med2: String,
    pub severity: Severity,
    pub note: String,
    pub overlap_times: Vec<SlotOverlap>,
}

impl DetectedInteraction {
    /// Convenience for tests and persistence: conflict flag for one slot.
    pub fn conflict_at(&self, slot: DoseSlot) -> bool {
        self.overlap_times
            .iter()
            .find(|o| o.time == slot)
            .map(|o| o.conflict)
            .unwrap_or(false)
    }
}
