use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::interaction::DetectedInteraction;
use super::medicine::Medicine;

/// An analyzed prescription upload. Immutable after creation; reminders
/// reference it but never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Caller-supplied image reference (storage itself is external).
    pub image: String,
    /// Raw OCR output the medicines were extracted from.
    pub extracted_text: String,
    pub medicines: Vec<Medicine>,
    pub interactions: Vec<DetectedInteraction>,
    pub upload_date: DateTime<Utc>,
}
