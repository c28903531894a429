use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{NotifyBy, User};

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, name, email, whatsapp_number, push_token, notify_by,
         notifications_enabled, api_token_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.whatsapp_number,
            user.push_token,
            user.notify_by.as_str(),
            user.notifications_enabled as i32,
            user.api_token_hash,
            user.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, name, email, whatsapp_number, push_token, notify_by,
             notifications_enabled, api_token_hash, created_at
             FROM users WHERE id = ?1",
            params![id.to_string()],
            |row| user_row(row),
        )
        .optional()?;

    raw.map(user_from_row).transpose()
}

/// Resolve an API bearer token (by its SHA-256 hex hash) to a user.
pub fn find_user_by_token_hash(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<User>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT id, name, email, whatsapp_number, push_token, notify_by,
             notifications_enabled, api_token_hash, created_at
             FROM users WHERE api_token_hash = ?1",
            params![token_hash],
            |row| user_row(row),
        )
        .optional()?;

    raw.map(user_from_row).transpose()
}

struct UserRow {
    id: String,
    name: String,
    email: String,
    whatsapp_number: Option<String>,
    push_token: Option<String>,
    notify_by: String,
    notifications_enabled: i32,
    api_token_hash: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        whatsapp_number: row.get(3)?,
        push_token: row.get(4)?,
        notify_by: row.get(5)?,
        notifications_enabled: row.get(6)?,
        api_token_hash: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn user_from_row(raw: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: Uuid::parse_str(&raw.id).map_err(|_| DatabaseError::InvalidValue {
            field: "users.id".into(),
            value: raw.id.clone(),
        })?,
        name: raw.name,
        email: raw.email,
        whatsapp_number: raw.whatsapp_number,
        push_token: raw.push_token,
        notify_by: NotifyBy::from_str(&raw.notify_by)?,
        notifications_enabled: raw.notifications_enabled != 0,
        api_token_hash: raw.api_token_hash,
        created_at: raw.created_at,
    })
}
