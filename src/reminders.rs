//! Reminder lifecycle: manual creation, batch generation from a
//! prescription, and taken/missed bookkeeping on the history log.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::authorization::ActionClaims;
use crate::db::repository::{history, prescription as prescription_repo, reminder as reminder_repo};
use crate::db::DatabaseError;
use crate::interactions::parse_frequency;
use crate::models::{
    DoseSlot, HistoryStatus, NotifyBy, Reminder, ReminderHistory, ReminderStatus,
};

static RE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap());
static RE_DURATION_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*days").unwrap());

#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Invalid reminder: {0}")]
    Validation(String),

    #[error("Reminder history entry not found")]
    HistoryNotFound,

    #[error("Not allowed to update this history entry")]
    Forbidden,
}

/// Fields a client supplies when setting a reminder by hand.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    pub prescription_id: Uuid,
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    /// Wall-clock "HH:MM" in the deployment timezone.
    pub time: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

fn validate(input: &NewReminder) -> Result<(), ReminderError> {
    if input.medicine_name.trim().is_empty() {
        return Err(ReminderError::Validation("medicine name is required".into()));
    }
    if !RE_TIME.is_match(&input.time) {
        return Err(ReminderError::Validation(format!(
            "time must be HH:MM (24-hour), got {:?}",
            input.time
        )));
    }
    if input.start_date > input.end_date {
        return Err(ReminderError::Validation("start date is after end date".into()));
    }
    Ok(())
}

/// Create one reminder from client-supplied fields. The notification
/// route is frozen from the user's current preference at creation time.
pub fn create_reminder(
    conn: &Connection,
    user_id: Uuid,
    notify_by: NotifyBy,
    input: NewReminder,
) -> Result<Reminder, ReminderError> {
    validate(&input)?;

    let reminder = Reminder {
        id: Uuid::new_v4(),
        user_id,
        prescription_id: input.prescription_id,
        medicine_name: input.medicine_name.trim().to_string(),
        dosage: input.dosage.trim().to_string(),
        time: input.time,
        start_date: input.start_date,
        end_date: input.end_date,
        notify_by,
        status: ReminderStatus::Active,
        created_at: Utc::now(),
    };
    reminder_repo::insert_reminder(conn, &reminder)?;
    Ok(reminder)
}

/// Parse "N days" into a day count; zero and unparsable both mean the
/// medicine has no usable course length.
fn duration_days(duration: &str) -> u32 {
    RE_DURATION_DAYS
        .captures(duration)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Generate reminders for every dosing slot of every medicine on a
/// prescription, starting today.
///
/// Medicines missing a frequency or a usable duration are skipped, not
/// an error — extraction is lossy and the patient can always add the
/// reminder manually. Returns the created reminders.
pub fn generate_reminders(
    conn: &Connection,
    prescription_id: &Uuid,
    notify_by: NotifyBy,
    today: NaiveDate,
) -> Result<Vec<Reminder>, ReminderError> {
    let Some(prescription) = prescription_repo::get_prescription(conn, prescription_id)? else {
        return Err(ReminderError::Validation("prescription not found".into()));
    };

    let mut created = Vec::new();
    for medicine in &prescription.medicines {
        let days = duration_days(&medicine.duration);
        if medicine.frequency.is_empty() || days == 0 {
            continue;
        }
        let end_date = today + Duration::days(i64::from(days));

        let slots = parse_frequency(&medicine.frequency);
        for slot in DoseSlot::ALL {
            if slots[slot.index()] == 0 {
                continue;
            }
            let reminder = Reminder {
                id: Uuid::new_v4(),
                user_id: prescription.user_id,
                prescription_id: prescription.id,
                medicine_name: medicine.name.clone(),
                dosage: medicine.dosage.clone(),
                time: slot.dispatch_time().to_string(),
                start_date: today,
                end_date,
                notify_by,
                status: ReminderStatus::Active,
                created_at: Utc::now(),
            };
            reminder_repo::insert_reminder(conn, &reminder)?;
            created.push(reminder);
        }
    }

    if !created.is_empty() {
        tracing::info!(
            prescription = %prescription_id,
            count = created.len(),
            "Generated reminders from prescription"
        );
    }
    Ok(created)
}

/// Who is asking to change a history entry's status.
pub enum UpdateAuthority {
    /// A logged-in user; may only touch their own entries.
    Owner(Uuid),
    /// A consumed action token, already bound to one entry.
    ActionToken(ActionClaims),
}

/// Record the patient's response to a dispatched reminder.
///
/// Only `taken` and `missed` are accepted: the dispatch statuses are
/// owned by the sweep and must not be forged from outside.
pub fn update_history_status(
    conn: &Connection,
    authority: &UpdateAuthority,
    history_id: &Uuid,
    status: HistoryStatus,
) -> Result<ReminderHistory, ReminderError> {
    if !matches!(status, HistoryStatus::Taken | HistoryStatus::Missed) {
        return Err(ReminderError::Validation(format!(
            "status must be taken or missed, got {}",
            status.as_str()
        )));
    }

    let Some(entry) = history::find_history(conn, history_id)? else {
        return Err(ReminderError::HistoryNotFound);
    };

    let allowed = match authority {
        UpdateAuthority::Owner(user_id) => entry.user_id == *user_id,
        UpdateAuthority::ActionToken(claims) => {
            claims.user_id == entry.user_id && claims.history_id == entry.id
        }
    };
    if !allowed {
        return Err(ReminderError::Forbidden);
    }

    history::update_status(conn, history_id, status)?;
    let Some(updated) = history::find_history(conn, history_id)? else {
        return Err(ReminderError::HistoryNotFound);
    };
    Ok(updated)
}
