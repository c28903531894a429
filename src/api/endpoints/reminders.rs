//! Reminder endpoints: manual creation, batch generation, listing, and
//! history updates.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::middleware::auth::authenticate_bearer;
use crate::api::types::{ApiContext, Principal};
use crate::authorization::ActionPurpose;
use crate::db::repository::{history, prescription as prescription_repo, reminder as reminder_repo};
use crate::models::{HistoryStatus, Reminder, ReminderHistory};
use crate::reminders::{
    create_reminder, generate_reminders, update_history_status, NewReminder, UpdateAuthority,
};
use crate::scheduler::SweepInstant;

/// `POST /api/reminders` — set a reminder by hand.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Json(input): Json<NewReminder>,
) -> Result<Json<Reminder>, ApiError> {
    let conn = ctx.open_db()?;

    // The reminder must hang off one of the caller's own prescriptions.
    prescription_repo::get_prescription(&conn, &input.prescription_id)?
        .filter(|p| p.user_id == principal.user.id)
        .ok_or_else(|| ApiError::BadRequest("Prescription not found".into()))?;

    let reminder =
        create_reminder(&conn, principal.user.id, principal.user.notify_by, input)?;
    Ok(Json(reminder))
}

/// `GET /api/reminders` — the caller's reminders, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let conn = ctx.open_db()?;
    let reminders = reminder_repo::list_reminders_for_user(&conn, &principal.user.id)?;
    Ok(Json(reminders))
}

/// `POST /api/prescriptions/:id/reminders` — generate reminders from a
/// prescription's extracted medicines.
pub async fn generate(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
    Path(prescription_id): Path<Uuid>,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    let conn = ctx.open_db()?;

    prescription_repo::get_prescription(&conn, &prescription_id)?
        .filter(|p| p.user_id == principal.user.id)
        .ok_or_else(|| ApiError::NotFound("Prescription not found".into()))?;

    let today = SweepInstant::from_utc(Utc::now(), ctx.timezone).today;
    let created =
        generate_reminders(&conn, &prescription_id, principal.user.notify_by, today)?;
    Ok(Json(created))
}

/// `GET /api/reminders/history` — dispatch log, newest first.
pub async fn list_history(
    State(ctx): State<ApiContext>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<ReminderHistory>>, ApiError> {
    let conn = ctx.open_db()?;
    let entries = history::list_history_for_user(&conn, &principal.user.id)?;
    Ok(Json(entries))
}

#[derive(Deserialize)]
pub struct UpdateHistoryRequest {
    pub status: HistoryStatus,
}

/// `PUT /api/reminders/history/:id` — mark a dose taken or missed.
///
/// Sits outside the auth middleware: a push notification action button
/// authenticates with `X-Action-Token` instead of a session. The token
/// is consumed even if the update then fails — single-use is strict.
pub async fn update_history(
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<UpdateHistoryRequest>,
) -> Result<Json<ReminderHistory>, ApiError> {
    let authority = match headers.get("X-Action-Token").and_then(|v| v.to_str().ok()) {
        Some(token) => {
            let claims = ctx
                .tokens
                .validate_and_consume(token, ActionPurpose::UpdateReminderStatus)
                .ok_or(ApiError::Unauthorized)?;
            UpdateAuthority::ActionToken(claims)
        }
        None => UpdateAuthority::Owner(authenticate_bearer(&ctx, &headers)?.id),
    };

    let conn = ctx.open_db()?;
    let updated = update_history_status(&conn, &authority, &id, req.status)?;
    Ok(Json(updated))
}
