//! Prescription intake pipeline: OCR text in, structured prescription
//! with medicines and interaction warnings out.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::prescription as prescription_repo;
use crate::db::DatabaseError;
use crate::extract::extract_medicines;
use crate::interactions::check_interactions;
use crate::models::{DetectedInteraction, Medicine, Prescription};
use crate::ocr::{OcrClient, OcrError};
use crate::reference::ReferenceData;

#[derive(Debug, Error)]
pub enum PrescriptionError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
}

/// Extraction result before anything is persisted. The analyze endpoint
/// returns this directly so the client can show what was recognized and
/// let the patient correct it.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub extracted_text: String,
    pub medicines: Vec<Medicine>,
    pub interactions: Vec<DetectedInteraction>,
}

/// Analyze prescription text without persisting. Pure over the loaded
/// reference data.
pub fn analyze_text(text: &str, reference: &ReferenceData) -> Analysis {
    let medicines = extract_medicines(text, reference);
    let interactions = check_interactions(&medicines, reference);
    Analysis { extracted_text: text.to_string(), medicines, interactions }
}

/// Analyze an uploaded prescription image: OCR it, then extract.
pub async fn analyze_image(
    ocr: &OcrClient,
    image_url: &str,
    reference: &ReferenceData,
) -> Result<Analysis, PrescriptionError> {
    let text = ocr.recognize(image_url).await?;
    Ok(analyze_text(&text, reference))
}

/// Persist a prescription from an analysis. An analysis with zero
/// medicines is still stored — the image and raw text stay reviewable
/// even when extraction found nothing.
pub fn create_prescription(
    conn: &Connection,
    user_id: Uuid,
    image: String,
    analysis: Analysis,
) -> Result<Prescription, PrescriptionError> {
    let prescription = Prescription {
        id: Uuid::new_v4(),
        user_id,
        image,
        extracted_text: analysis.extracted_text,
        medicines: analysis.medicines,
        interactions: analysis.interactions,
        upload_date: Utc::now(),
    };
    prescription_repo::insert_prescription(conn, &prescription)?;

    tracing::info!(
        prescription = %prescription.id,
        medicines = prescription.medicines.len(),
        interactions = prescription.interactions.len(),
        "Prescription stored"
    );
    Ok(prescription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::reminder::tests::seed_user_and_prescription;
    use crate::db::sqlite::open_memory_database;
    use crate::reference::tests::sample_reference;

    #[test]
    fn analysis_extracts_and_cross_checks() {
        let reference = sample_reference();
        let analysis =
            analyze_text("PCM 500mg 1-0-1 5 days\nAmoxicillin 250mg 1-1-1 7 days", &reference);

        assert_eq!(analysis.medicines.len(), 2);
        assert_eq!(analysis.interactions.len(), 1);
    }

    #[test]
    fn empty_text_produces_empty_analysis() {
        let reference = sample_reference();
        let analysis = analyze_text("", &reference);
        assert!(analysis.medicines.is_empty());
        assert!(analysis.interactions.is_empty());
    }

    #[test]
    fn created_prescription_round_trips() {
        let conn = open_memory_database().unwrap();
        let (user_id, _) = seed_user_and_prescription(&conn);
        let reference = sample_reference();

        let analysis = analyze_text("Paracetamol 500mg 1-0-1 5 days", &reference);
        let created =
            create_prescription(&conn, user_id, "rx-001.jpg".into(), analysis).unwrap();

        let stored = prescription_repo::get_prescription(&conn, &created.id).unwrap().unwrap();
        assert_eq!(stored.medicines, created.medicines);
        assert_eq!(stored.extracted_text, created.extracted_text);
    }

    #[test]
    fn medicine_free_prescription_is_still_stored() {
        let conn = open_memory_database().unwrap();
        let (user_id, _) = seed_user_and_prescription(&conn);
        let reference = sample_reference();

        let analysis = analyze_text("illegible scrawl", &reference);
        let created = create_prescription(&conn, user_id, "rx-002.jpg".into(), analysis).unwrap();

        let stored = prescription_repo::get_prescription(&conn, &created.id).unwrap().unwrap();
        assert!(stored.medicines.is_empty());
        assert_eq!(stored.extracted_text, "illegible scrawl");
    }
}
