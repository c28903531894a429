use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{HistoryStatus, NotificationMethod, NotifyBy, ReminderStatus};

/// A scheduled medication reminder.
///
/// Fires when the sweep's local minute equals `time` and `start_date ≤
/// today ≤ end_date`. Rows are never deleted; the only status transition
/// is active → expired once `end_date` is in the past.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prescription_id: Uuid,
    pub medicine_name: String,
    pub dosage: String,
    /// Scheduled minute, "HH:MM" in the service timezone.
    pub time: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notify_by: NotifyBy,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
}

/// One record per sweep firing attempt for a reminder. Created `pending`
/// before dispatch so an attempt is on record even if dispatch crashes;
/// moved to sent/failed by the sweep and to taken/missed by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reminder_id: Uuid,
    pub medicine_name: String,
    /// The reminder's "HH:MM" at the time of firing.
    pub scheduled_time: String,
    pub trigger_date: DateTime<Utc>,
    pub status: HistoryStatus,
    pub notification_method: NotificationMethod,
}
