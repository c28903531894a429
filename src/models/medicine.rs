use serde::{Deserialize, Serialize};

/// A medicine extracted from prescription OCR text.
///
/// `name` is always the canonical dictionary spelling, never a common-name
/// alias. The remaining fields keep whatever the parser could recover;
/// an empty string means "unknown", not zero — callers must not treat a
/// missing dosage or duration as a numeric default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medicine {
    pub name: String,
    /// First dosage token found, e.g. "500mg".
    pub dosage: String,
    /// Dash-separated slot pattern ("1-0-1-0") or the literal "Stat".
    pub frequency: String,
    /// Course length, e.g. "7 days", leading zeros stripped.
    pub duration: String,
}
