use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::prescription::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{NotifyBy, Reminder, ReminderStatus};

pub fn insert_reminder(conn: &Connection, r: &Reminder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (id, user_id, prescription_id, medicine_name, dosage,
         time, start_date, end_date, notify_by, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            r.id.to_string(),
            r.user_id.to_string(),
            r.prescription_id.to_string(),
            r.medicine_name,
            r.dosage,
            r.time,
            r.start_date,
            r.end_date,
            r.notify_by.as_str(),
            r.status.as_str(),
            r.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_reminder(conn: &Connection, id: &Uuid) -> Result<Option<Reminder>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("{SELECT_REMINDER} WHERE id = ?1"),
            params![id.to_string()],
            |row| reminder_row(row),
        )
        .optional()?;

    raw.map(reminder_from_row).transpose()
}

pub fn list_reminders_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("{SELECT_REMINDER} WHERE user_id = ?1 ORDER BY created_at DESC"))?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| reminder_row(row))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(reminder_from_row(row?)?);
    }
    Ok(out)
}

/// Bulk active → expired transition for reminders whose end date has
/// passed. Idempotent; returns the number of rows flipped. Runs before
/// the due query within a sweep so a reminder cannot fire on the day
/// after its range ends.
pub fn expire_overdue(conn: &Connection, today: NaiveDate) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE reminders SET status = 'expired' WHERE status = 'active' AND end_date < ?1",
        params![today],
    )?;
    Ok(changed)
}

/// Active reminders whose date range covers `today`. The minute match is
/// applied by the caller (`scheduler::sweep::compute_due_reminders`) so
/// due selection stays a pure, clock-free function.
pub fn active_reminders_on(
    conn: &Connection,
    today: NaiveDate,
) -> Result<Vec<Reminder>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_REMINDER} WHERE status = 'active' AND start_date <= ?1 AND end_date >= ?1
         ORDER BY created_at"
    ))?;
    let rows = stmt.query_map(params![today], |row| reminder_row(row))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(reminder_from_row(row?)?);
    }
    Ok(out)
}

const SELECT_REMINDER: &str = "SELECT id, user_id, prescription_id, medicine_name, dosage,
     time, start_date, end_date, notify_by, status, created_at FROM reminders";

struct ReminderRow {
    id: String,
    user_id: String,
    prescription_id: String,
    medicine_name: String,
    dosage: String,
    time: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    notify_by: String,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn reminder_row(row: &Row<'_>) -> rusqlite::Result<ReminderRow> {
    Ok(ReminderRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        prescription_id: row.get(2)?,
        medicine_name: row.get(3)?,
        dosage: row.get(4)?,
        time: row.get(5)?,
        start_date: row.get(6)?,
        end_date: row.get(7)?,
        notify_by: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn reminder_from_row(raw: ReminderRow) -> Result<Reminder, DatabaseError> {
    Ok(Reminder {
        id: parse_uuid("reminders.id", &raw.id)?,
        user_id: parse_uuid("reminders.user_id", &raw.user_id)?,
        prescription_id: parse_uuid("reminders.prescription_id", &raw.prescription_id)?,
        medicine_name: raw.medicine_name,
        dosage: raw.dosage,
        time: raw.time,
        start_date: raw.start_date,
        end_date: raw.end_date,
        notify_by: NotifyBy::from_str(&raw.notify_by)?,
        status: ReminderStatus::from_str(&raw.status)?,
        created_at: raw.created_at,
    })
}
