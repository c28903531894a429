use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::prescription::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{HistoryStatus, NotificationMethod, ReminderHistory};

pub fn insert_history(conn: &Connection, h: &ReminderHistory) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminder_history (id, user_id, reminder_id, medicine_name,
         scheduled_time, trigger_date, status, notification_method)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            h.id.to_string(),
            h.user_id.to_string(),
            h.reminder_id.to_string(),
            h.medicine_name,
            h.scheduled_time,
            h.trigger_date,
            h.status.as_str(),
            h.notification_method.as_str(),
        ],
    )?;
    Ok(())
}

/// Record the dispatch outcome for a pending history row.
pub fn update_dispatch_outcome(
    conn: &Connection,
    id: &Uuid,
    status: HistoryStatus,
    method: NotificationMethod,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE reminder_history SET status = ?1, notification_method = ?2 WHERE id = ?3",
        params![status.as_str(), method.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "reminder_history".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// User-initiated status update (taken/missed).
pub fn update_status(
    conn: &Connection,
    id: &Uuid,
    status: HistoryStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE reminder_history SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "reminder_history".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn find_history(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<ReminderHistory>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("{SELECT_HISTORY} WHERE id = ?1"),
            params![id.to_string()],
            |row| history_row(row),
        )
        .optional()?;

    raw.map(history_from_row).transpose()
}

/// History for a user, most recent attempt first.
pub fn list_history_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<ReminderHistory>, DatabaseError> {
    let mut stmt = conn
        .prepare(&format!("{SELECT_HISTORY} WHERE user_id = ?1 ORDER BY trigger_date DESC"))?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| history_row(row))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(history_from_row(row?)?);
    }
    Ok(out)
}

/// Attempts recorded for one reminder on one (UTC) calendar day.
/// Used to verify the one-row-per-sweep guarantee.
pub fn count_attempts_on(
    conn: &Connection,
    reminder_id: &Uuid,
    day: NaiveDate,
) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reminder_history
         WHERE reminder_id = ?1 AND trigger_date >= ?2 AND trigger_date < ?3",
        params![
            reminder_id.to_string(),
            day.and_hms_opt(0, 0, 0).map(|d| d.and_utc()),
            day.succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc()),
        ],
        |row| row.get(0),
    )?;
    Ok(count)
}

const SELECT_HISTORY: &str = "SELECT id, user_id, reminder_id, medicine_name, scheduled_time,
     trigger_date, status, notification_method FROM reminder_history";

struct HistoryRow {
    id: String,
    user_id: String,
    reminder_id: String,
    medicine_name: String,
    scheduled_time: String,
    trigger_date: DateTime<Utc>,
    status: String,
    notification_method: String,
}

fn history_row(row: &Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok(HistoryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        reminder_id: row.get(2)?,
        medicine_name: row.get(3)?,
        scheduled_time: row.get(4)?,
        trigger_date: row.get(5)?,
        status: row.get(6)?,
        notification_method: row.get(7)?,
    })
}

fn history_from_row(raw: HistoryRow) -> Result<ReminderHistory, DatabaseError> {
    Ok(ReminderHistory {
        id: parse_uuid("reminder_history.id", &raw.id)?,
        user_id: parse_uuid("reminder_history.user_id", &raw.user_id)?,
        reminder_id: parse_uuid("reminder_history.reminder_id", &raw.reminder_id)?,
        medicine_name: raw.medicine_name,
        scheduled_time: raw.scheduled_time,
        trigger_date: raw.trigger_date,
        status: HistoryStatus::from_str(&raw.status)?,
        notification_method: NotificationMethod::from_str(&raw.notification_method)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::reminder::tests::{sample_reminder, seed_user_and_prescription};
    use crate::db::repository::reminder::insert_reminder;

    fn sample_history(user_id: Uuid, reminder_id: Uuid) -> ReminderHistory {
        ReminderHistory {
            id: Uuid::new_v4(),
            user_id,
            reminder_id,
            medicine_name: "Paracetamol".into(),
            scheduled_time: "08:00".into(),
            trigger_date: Utc::now(),
            status: HistoryStatus::Pending,
            notification_method: NotificationMethod::None,
        }
    }

    #[test]
    fn history_round_trips_and_updates() {
        let conn = open_memory_database().unwrap();
        let (user_id, prescription_id) = seed_user_and_prescription(&conn);
        let reminder = sample_reminder(user_id, prescription_id);
        insert_reminder(&conn, &reminder).unwrap();

        let h = sample_history(user_id, reminder.id);
        insert_history(&conn, &h).unwrap();

        update_dispatch_outcome(&conn, &h.id, HistoryStatus::Sent, NotificationMethod::Push)
            .unwrap();
        let found = find_history(&conn, &h.id).unwrap().unwrap();
        assert_eq!(found.status, HistoryStatus::Sent);
        assert_eq!(found.notification_method, NotificationMethod::Push);

        update_status(&conn, &h.id, HistoryStatus::Taken).unwrap();
        let found = find_history(&conn, &h.id).unwrap().unwrap();
        assert_eq!(found.status, HistoryStatus::Taken);
        // Dispatch channel is untouched by a user status update
        assert_eq!(found.notification_method, NotificationMethod::Push);
    }

    #[test]
    fn update_of_missing_row_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = update_status(&conn, &Uuid::new_v4(), HistoryStatus::Taken).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn counts_attempts_per_day() {
        let conn = open_memory_database().unwrap();
        let (user_id, prescription_id) = seed_user_and_prescription(&conn);
        let reminder = sample_reminder(user_id, prescription_id);
        insert_reminder(&conn, &reminder).unwrap();

        let mut h = sample_history(user_id, reminder.id);
        h.trigger_date = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            .and_utc();
        insert_history(&conn, &h).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(count_attempts_on(&conn, &reminder.id, day).unwrap(), 1);
        let other = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(count_attempts_on(&conn, &reminder.id, other).unwrap(), 0);
    }
}
