use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{CreateUser, User};

fn now() -> i64 {
    Utc::now().timestamp()
}

const USER_COLS: &str = "id, username, premium, created_at, updated_at";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        premium: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

/// Create a user record. Registration is an external collaborator of the
/// confirmation workflow; this exists for the dev seeder and tests.
pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    input.validate()?;
    let now = now();

    conn.execute(
        "INSERT INTO users (id, username, premium, created_at, updated_at)
         VALUES (?1, ?2, 0, ?3, ?4)",
        params![&input.id, &input.username, now, now],
    )?;

    Ok(User {
        id: input.id.clone(),
        username: input.username.clone(),
        premium: false,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Set `premium = 1` for a user. Returns whether a record matched.
///
/// This is a constant assignment, never a toggle, so replaying the same
/// completion webhook leaves the record in the same state.
pub fn grant_premium(conn: &Connection, user_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET premium = 1, updated_at = ?1 WHERE id = ?2",
        params![now(), user_id],
    )?;
    Ok(affected > 0)
}
