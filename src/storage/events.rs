//! Audit event storage.
//!
//! Events are written inside the same transaction as the mutation that
//! produced them (see [`super::SqliteStorage::mutate`]) and are removed with
//! their ticket.

use rusqlite::{Connection, Transaction, params};

use crate::error::Result;
use crate::model::{Event, EventType};

use super::sqlite::parse_datetime;

/// Insert an event within a transaction.
///
/// # Errors
///
/// Returns an error if the database insert fails.
pub fn insert_event(tx: &Transaction<'_>, event: &Event) -> Result<i64> {
    tx.execute(
        r"
        INSERT INTO events (ticket_id, event_type, old_value, new_value, comment, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            event.ticket_id,
            event.event_type.as_str(),
            event.old_value,
            event.new_value,
            event.comment,
            event.created_at.to_rfc3339(),
        ],
    )?;

    Ok(tx.last_insert_rowid())
}

/// Get events for a ticket, oldest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_events(conn: &Connection, ticket_id: i64) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        r"
        SELECT id, ticket_id, event_type, old_value, new_value, comment, created_at
        FROM events
        WHERE ticket_id = ?1
        ORDER BY id ASC
        ",
    )?;

    let events = stmt
        .query_map([ticket_id], |row| {
            let event_type: String = row.get(2)?;
            let event_type = event_type.parse::<EventType>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(Event {
                id: row.get(0)?,
                ticket_id: row.get(1)?,
                event_type,
                old_value: row.get(3)?,
                new_value: row.get(4)?,
                comment: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Count all events in the database.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_events(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
    Ok(usize::try_from(count).unwrap_or(0))
}
