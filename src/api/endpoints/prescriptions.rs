//! Prescription endpoints: upload/analyze, list, detail.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Principal};
use crate::db::repository::prescription as prescription_repo;
use crate::models::Prescription;
use crate::prescriptions::{analyze_image, analyze_text, create_prescription};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrescriptionRequest {
    /// Reference to the uploaded image; passed to the OCR service.
    pub image_url: Option<String>,
    /// Pre-extracted text. When present, OCR is skipped — used by
    /// clients that run recognition locally.
    pub text: Option<String>,
}

/// `POST /api/prescriptions` — analyze and store a prescription.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreatePrescriptionRequest>,
) -> Result<Json<Prescription>, ApiError> {
    let analysis = match (&req.text, &req.image_url) {
        (Some(text), _) => analyze_text(text, &ctx.reference),
        (None, Some(image_url)) => {
            let Some(ocr) = &*ctx.ocr else {
                return Err(ApiError::BadRequest(
                    "No OCR service configured; supply extracted text".into(),
                ));
            };
            analyze_image(ocr, image_url, &ctx.reference).await?
        }
        (None, None) => {
            return Err(ApiError::BadRequest("Provide imageUrl or text".into()));
        }
    };

    let conn = ctx.open_db()?;
    let prescription = create_prescription(
        &conn,
        principal.user.id,
        req.image_url.unwrap_or_default(),
        analysis,
    )?;
    Ok(Json(prescription))
}

/// `GET /api/prescriptions` — the caller's prescriptions, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Prescription>>, ApiError> {
    let conn = ctx.open_db()?;
    let prescriptions =
        prescription_repo::get_prescriptions_for_user(&conn, &principal.user.id)?;
    Ok(Json(prescriptions))
}

/// `GET /api/prescriptions/:id` — one prescription, owner only.
/// Another user's prescription reads as not found.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> Result<Json<Prescription>, ApiError> {
    let conn = ctx.open_db()?;
    let prescription = prescription_repo::get_prescription(&conn, &id)?
        .filter(|p| p.user_id == principal.user.id)
        .ok_or_else(|| ApiError::NotFound("Prescription not found".into()))?;
    Ok(Json(prescription))
}
