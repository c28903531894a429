//! One scheduling sweep: expire, select, record, dispatch.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use super::clock::SweepInstant;
use crate::authorization::{ActionPurpose, ActionTokenStore};
use crate::db::repository::{history, reminder as reminder_repo, user as user_repo};
use crate::db::DatabaseError;
use crate::models::{HistoryStatus, NotificationMethod, Reminder, ReminderHistory};
use crate::notify::{dispatch_reminder, Notifier, PushContext};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Collaborators a sweep needs beyond the database.
pub struct SweepContext {
    pub notifier: Arc<dyn Notifier>,
    pub tokens: Arc<ActionTokenStore>,
}

/// Counters from one sweep, for the log line and the manual trigger
/// endpoint's response.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SweepOutcome {
    pub expired: usize,
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Select the reminders due at this exact minute from the active set.
/// Pure so the minute-match rule is testable without a database.
pub fn compute_due_reminders(
    today: NaiveDate,
    minute: &str,
    active: &[Reminder],
) -> Vec<Reminder> {
    active
        .iter()
        .filter(|r| r.time == minute && r.start_date <= today && r.end_date >= today)
        .cloned()
        .collect()
}

/// Run one full sweep at the given instant.
///
/// Order matters: expiry runs first, so a reminder whose window ended
/// yesterday is never dispatched even if its minute matches. Every
/// dispatch attempt leaves exactly one history row, written as
/// `pending` before the first network call and settled to `sent` or
/// `failed` afterwards — a crash mid-dispatch leaves a visible pending
/// row instead of a silent gap.
pub async fn run_sweep(
    conn: &mut Connection,
    ctx: &SweepContext,
    at: &SweepInstant,
) -> Result<SweepOutcome, SweepError> {
    let mut outcome = SweepOutcome::default();

    outcome.expired = reminder_repo::expire_overdue(conn, at.today)?;
    if outcome.expired > 0 {
        tracing::info!(count = outcome.expired, "Expired reminders past their end date");
    }

    let active = reminder_repo::active_reminders_on(conn, at.today)?;
    let due = compute_due_reminders(at.today, &at.minute, &active);
    outcome.due = due.len();

    for reminder in due {
        let Some(user) = user_repo::find_user(conn, &reminder.user_id)? else {
            tracing::warn!(reminder = %reminder.id, "Due reminder has no user; skipping");
            outcome.skipped += 1;
            continue;
        };

        // Users who paused notifications are skipped without a history
        // row: nothing was attempted on their behalf.
        if !user.notifications_enabled {
            outcome.skipped += 1;
            continue;
        }

        let entry = ReminderHistory {
            id: Uuid::new_v4(),
            user_id: user.id,
            reminder_id: reminder.id,
            medicine_name: reminder.medicine_name.clone(),
            scheduled_time: reminder.time.clone(),
            trigger_date: at.now_utc,
            status: HistoryStatus::Pending,
            notification_method: NotificationMethod::None,
        };
        history::insert_history(conn, &entry)?;

        let token =
            ctx.tokens.mint(user.id, entry.id, ActionPurpose::UpdateReminderStatus);
        let push_context =
            PushContext { history_id: entry.id.to_string(), action_token: token };

        let dispatch =
            dispatch_reminder(ctx.notifier.as_ref(), &user, &reminder, at.slot_label(), &push_context)
                .await;

        for (channel, err) in &dispatch.failed {
            tracing::warn!(
                reminder = %reminder.id,
                channel = channel.as_str(),
                error = %err,
                "Notification channel failed"
            );
        }

        if dispatch.any_delivered() {
            history::update_dispatch_outcome(conn, &entry.id, HistoryStatus::Sent, dispatch.method())?;
            outcome.sent += 1;
        } else {
            history::update_dispatch_outcome(
                conn,
                &entry.id,
                HistoryStatus::Failed,
                NotificationMethod::None,
            )?;
            outcome.failed += 1;
        }
    }

    if outcome.due > 0 {
        tracing::info!(
            due = outcome.due,
            sent = outcome.sent,
            failed = outcome.failed,
            skipped = outcome.skipped,
            minute = %at.minute,
            "Sweep dispatched reminders"
        );
    }

    Ok(outcome)
}
