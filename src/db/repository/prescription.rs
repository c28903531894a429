use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{
    DetectedInteraction, DoseSlot, Medicine, Prescription, Severity, SlotOverlap,
};

pub fn insert_prescription(conn: &Connection, p: &Prescription) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO prescriptions (id, user_id, image, extracted_text, upload_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            p.id.to_string(),
            p.user_id.to_string(),
            p.image,
            p.extracted_text,
            p.upload_date,
        ],
    )?;

    for med in &p.medicines {
        conn.execute(
            "INSERT INTO prescription_medicines (id, prescription_id, name, dosage, frequency, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                p.id.to_string(),
                med.name,
                med.dosage,
                med.frequency,
                med.duration,
            ],
        )?;
    }

    for inter in &p.interactions {
        conn.execute(
            "INSERT INTO prescription_interactions
             (id, prescription_id, med1, med2, severity, note,
              morning_conflict, afternoon_conflict, evening_conflict, night_conflict)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                Uuid::new_v4().to_string(),
                p.id.to_string(),
                inter.med1,
                inter.med2,
                inter.severity.as_str(),
                inter.note,
                inter.conflict_at(DoseSlot::Morning) as i32,
                inter.conflict_at(DoseSlot::Afternoon) as i32,
                inter.conflict_at(DoseSlot::Evening) as i32,
                inter.conflict_at(DoseSlot::Night) as i32,
            ],
        )?;
    }

    Ok(())
}

pub fn get_prescription(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Prescription>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, user_id, image, extracted_text, upload_date
             FROM prescriptions WHERE id = ?1",
            params![id.to_string()],
            |row| prescription_row(row),
        )
        .optional()?;

    match raw {
        Some(raw) => Ok(Some(assemble(conn, raw)?)),
        None => Ok(None),
    }
}

/// All prescriptions for a user, newest upload first.
pub fn get_prescriptions_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, image, extracted_text, upload_date
         FROM prescriptions WHERE user_id = ?1 ORDER BY upload_date DESC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| prescription_row(row))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(assemble(conn, row?)?);
    }
    Ok(out)
}

fn load_medicines(conn: &Connection, prescription_id: &str) -> Result<Vec<Medicine>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name, dosage, frequency, duration
         FROM prescription_medicines WHERE prescription_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok(Medicine {
            name: row.get(0)?,
            dosage: row.get(1)?,
            frequency: row.get(2)?,
            duration: row.get(3)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn load_interactions(
    conn: &Connection,
    prescription_id: &str,
) -> Result<Vec<DetectedInteraction>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT med1, med2, severity, note,
         morning_conflict, afternoon_conflict, evening_conflict, night_conflict
         FROM prescription_interactions WHERE prescription_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![prescription_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            [
                row.get::<_, i32>(4)?,
                row.get::<_, i32>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, i32>(7)?,
            ],
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (med1, med2, severity, note, conflicts) = row?;
        out.push(DetectedInteraction {
            med1,
            med2,
            severity: Severity::from_str(&severity)?,
            note,
            overlap_times: DoseSlot::ALL
                .iter()
                .map(|slot| SlotOverlap { time: *slot, conflict: conflicts[slot.index()] != 0 })
                .collect(),
        });
    }
    Ok(out)
}

struct PrescriptionRow {
    id: String,
    user_id: String,
    image: String,
    extracted_text: String,
    upload_date: chrono::DateTime<chrono::Utc>,
}

fn prescription_row(row: &Row<'_>) -> rusqlite::Result<PrescriptionRow> {
    Ok(PrescriptionRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        image: row.get(2)?,
        extracted_text: row.get(3)?,
        upload_date: row.get(4)?,
    })
}

fn assemble(conn: &Connection, raw: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    let medicines = load_medicines(conn, &raw.id)?;
    let interactions = load_interactions(conn, &raw.id)?;
    Ok(Prescription {
        id: parse_uuid("prescriptions.id", &raw.id)?,
        user_id: parse_uuid("prescriptions.user_id", &raw.user_id)?,
        image: raw.image,
        extracted_text: raw.extracted_text,
        medicines,
        interactions,
        upload_date: raw.upload_date,
    })
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::user::insert_user;
    use crate::models::{NotifyBy, User};
    use chrono::Utc;

    fn seed_user(conn: &Connection) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            whatsapp_number: None,
            push_token: None,
            notify_by: NotifyBy::Email,
            notifications_enabled: true,
            api_token_hash: None,
            created_at: Utc::now(),
        };
        insert_user(conn, &user).unwrap();
        user.id
    }

    #[test]
    fn prescription_round_trips_with_children() {
        let conn = open_memory_database().unwrap();
        let user_id = seed_user(&conn);

        let p = Prescription {
            id: Uuid::new_v4(),
            user_id,
            image: "uploads/rx-001.jpg".into(),
            extracted_text: "Paracetamol 500mg 1-0-1 5 days".into(),
            medicines: vec![Medicine {
                name: "Paracetamol".into(),
                dosage: "500mg".into(),
                frequency: "1-0-1".into(),
                duration: "5 days".into(),
            }],
            interactions: vec![DetectedInteraction {
                med1: "Paracetamol".into(),
                med2: "Amoxicillin".into(),
                severity: Severity::Mild,
                note: "Monitor".into(),
                overlap_times: DoseSlot::ALL
                    .iter()
                    .map(|s| SlotOverlap { time: *s, conflict: *s == DoseSlot::Morning })
                    .collect(),
            }],
            upload_date: Utc::now(),
        };

        insert_prescription(&conn, &p).unwrap();
        let loaded = get_prescription(&conn, &p.id).unwrap().unwrap();
        assert_eq!(loaded.medicines, p.medicines);
        assert_eq!(loaded.interactions[0].severity, Severity::Mild);
        assert!(loaded.interactions[0].conflict_at(DoseSlot::Morning));
        assert!(!loaded.interactions[0].conflict_at(DoseSlot::Night));

        let all = get_prescriptions_for_user(&conn, &user_id).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn missing_prescription_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_prescription(&conn, &Uuid::new_v4()).unwrap().is_none());
    }
}
