//! `SQLite` storage implementation.

use crate::error::{Result, TrackerError};
use crate::lifecycle::{self, TransitionRequest};
use crate::model::{
    Event, EventType, NewTicket, Priority, Status, Ticket, TicketStats, TicketUpdate,
};
use crate::query::{self, TicketPage, TicketQuery};
use crate::storage::events::{get_events, insert_event};
use crate::storage::schema::apply_schema;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const TICKET_COLUMNS: &str =
    "id, title, description, status, priority, tags, created_at, updated_at, resolved_at";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Connection,
}

/// Context for a mutation operation, tracking side effects.
pub struct MutationContext {
    pub op_name: String,
    /// Timestamp shared by every change made in this mutation.
    pub now: DateTime<Utc>,
    pub events: Vec<Event>,
}

impl MutationContext {
    #[must_use]
    pub fn new(op_name: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            now: Utc::now(),
            events: Vec::new(),
        }
    }

    pub fn record_event(&mut self, event_type: EventType, ticket_id: i64, comment: Option<String>) {
        self.record_field_change(event_type, ticket_id, None, None, comment);
    }

    /// Record a field change event with old and new values.
    pub fn record_field_change(
        &mut self,
        event_type: EventType,
        ticket_id: i64,
        old_value: Option<String>,
        new_value: Option<String>,
        comment: Option<String>,
    ) {
        self.events.push(Event {
            id: 0, // Placeholder, DB assigns auto-inc ID
            ticket_id,
            event_type,
            old_value,
            new_value,
            comment,
            created_at: self.now,
        });
    }
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened database");
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Execute a mutation inside one immediate transaction.
    ///
    /// The closure performs the writes and records audit events on the
    /// context; events are written before commit. Any error rolls the whole
    /// mutation back.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails (e.g. database error, lifecycle rule).
    pub fn mutate<F, R>(&mut self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let mut ctx = MutationContext::new(op);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;
        debug!(op = %ctx.op_name, events = ctx.events.len(), "Committed mutation");

        Ok(result)
    }

    /// Create a new ticket in status `open`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad fields, `DuplicateTitle` if the
    /// title is taken, or a database error.
    pub fn create_ticket(&mut self, new: &NewTicket) -> Result<Ticket> {
        let new = new.validate()?;

        let ticket = self.mutate("create_ticket", |tx, ctx| {
            if title_taken(tx, &new.title, None)? {
                return Err(TrackerError::DuplicateTitle {
                    title: new.title.clone(),
                });
            }

            let now = ctx.now;
            tx.execute(
                "INSERT INTO tickets (
                    title, description, status, priority, tags, created_at, updated_at, resolved_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL)",
                rusqlite::params![
                    new.title,
                    new.description,
                    Status::Open.as_str(),
                    new.priority.as_str(),
                    serde_json::to_string(&new.tags)?,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            let id = tx.last_insert_rowid();

            ctx.record_event(
                EventType::Created,
                id,
                Some(format!("Created ticket: {}", new.title)),
            );

            Ok(Ticket {
                id,
                title: new.title.clone(),
                description: new.description.clone(),
                status: Status::Open,
                priority: new.priority,
                tags: new.tags.clone(),
                created_at: now,
                updated_at: now,
                resolved_at: None,
            })
        })?;

        info!(id = ticket.id, title = %ticket.title, "Created ticket");
        Ok(ticket)
    }

    /// Get a ticket by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_ticket(&self, id: i64) -> Result<Option<Ticket>> {
        fetch_ticket(&self.conn, id)
    }

    /// Get a ticket by ID, failing with `TicketNotFound` when absent.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` or a database error.
    pub fn require_ticket(&self, id: i64) -> Result<Ticket> {
        self.get_ticket(id)?
            .ok_or(TrackerError::TicketNotFound { id })
    }

    /// List tickets matching `query`, ordered and paginated.
    ///
    /// Status and priority are filtered in SQL; search, tag and ordering go
    /// through [`query::evaluate`].
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad page bounds or a database error.
    pub fn list_tickets(&self, query: &TicketQuery) -> Result<TicketPage> {
        query.validate()?;

        let mut sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(priority) = query.priority {
            sql.push_str(" AND priority = ?");
            params.push(Box::new(priority.as_str()));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let tickets = stmt
            .query_map(params_refs.as_slice(), ticket_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!(
            candidates = tickets.len(),
            order_by = %query.order_by,
            order_dir = %query.order_dir,
            "Listing tickets"
        );
        query::run(tickets, query)
    }

    /// Update a ticket's title, description, priority or tags.
    ///
    /// Status is never changed here; use [`Self::set_status`]. An update with
    /// no fields writes nothing and returns the stored ticket.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound`, a validation error, `DuplicateTitle`, or a
    /// database error.
    pub fn update_ticket(&mut self, id: i64, update: &TicketUpdate) -> Result<Ticket> {
        if update.is_empty() {
            debug!(id, "Empty update, nothing to write");
            return self.require_ticket(id);
        }
        let update = update.validate()?;

        let ticket = self.mutate("update_ticket", |tx, ctx| {
            let current = fetch_ticket(tx, id)?.ok_or(TrackerError::TicketNotFound { id })?;

            if let Some(title) = &update.title {
                if title_taken(tx, title, Some(id))? {
                    return Err(TrackerError::DuplicateTitle {
                        title: title.clone(),
                    });
                }
            }

            let next = lifecycle::apply_update(&current, &update, ctx.now);
            write_ticket(tx, &next)?;
            record_changes(ctx, &current, &next)?;
            Ok(next)
        })?;

        info!(id, "Updated ticket");
        Ok(ticket)
    }

    /// Move a ticket to another status, enforcing the lifecycle rules.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound`, a lifecycle validation error, or a database
    /// error.
    pub fn set_status(&mut self, id: i64, request: &TransitionRequest) -> Result<Ticket> {
        let ticket = self.mutate("set_status", |tx, ctx| {
            let current = fetch_ticket(tx, id)?.ok_or(TrackerError::TicketNotFound { id })?;

            let next = lifecycle::apply_transition(&current, request, ctx.now).inspect_err(|err| {
                warn!(id, from = %current.status, to = %request.status, %err, "Rejected status change");
            })?;
            write_ticket(tx, &next)?;

            let reason = request.trimmed_reason();
            ctx.record_field_change(
                EventType::StatusChanged,
                id,
                Some(current.status.as_str().to_string()),
                Some(next.status.as_str().to_string()),
                (!reason.is_empty()).then(|| reason.to_string()),
            );
            Ok(next)
        })?;

        info!(id, status = %ticket.status, "Changed ticket status");
        Ok(ticket)
    }

    /// Delete a ticket and its events.
    ///
    /// Returns the snapshot that was deleted.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound`, `Conflict` when the ticket is in progress,
    /// or a database error.
    pub fn delete_ticket(&mut self, id: i64) -> Result<Ticket> {
        let ticket = self.mutate("delete_ticket", |tx, _ctx| {
            let current = fetch_ticket(tx, id)?.ok_or(TrackerError::TicketNotFound { id })?;

            lifecycle::check_delete(&current).inspect_err(|err| {
                warn!(id, %err, "Rejected delete");
            })?;

            tx.execute("DELETE FROM tickets WHERE id = ?1", [id])?;
            Ok(current)
        })?;

        info!(id, title = %ticket.title, "Deleted ticket");
        Ok(ticket)
    }

    /// Ticket counts per status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn stats(&self) -> Result<TicketStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM tickets GROUP BY status")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stats = TicketStats::default();
        for (status, count) in rows {
            let status: Status = status.parse()?;
            stats.record(status, usize::try_from(count).unwrap_or(0));
        }
        Ok(stats)
    }

    /// Is `title` already used by a ticket other than `exclude_id`?
    ///
    /// Comparison ignores case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn title_exists(&self, title: &str, exclude_id: Option<i64>) -> Result<bool> {
        title_taken(&self.conn, title, exclude_id)
    }

    /// Audit events for a ticket, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` or a database error.
    pub fn get_events(&self, id: i64) -> Result<Vec<Event>> {
        self.require_ticket(id)?;
        get_events(&self.conn, id)
    }

    /// Count all tickets.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_tickets(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

fn fetch_ticket(conn: &Connection, id: i64) -> Result<Option<Ticket>> {
    let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row([id], ticket_from_row);

    match result {
        Ok(ticket) => Ok(Some(ticket)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_ticket(conn: &Connection, ticket: &Ticket) -> Result<()> {
    conn.execute(
        "UPDATE tickets SET
            title = ?1,
            description = ?2,
            status = ?3,
            priority = ?4,
            tags = ?5,
            updated_at = ?6,
            resolved_at = ?7
         WHERE id = ?8",
        rusqlite::params![
            ticket.title,
            ticket.description,
            ticket.status.as_str(),
            ticket.priority.as_str(),
            serde_json::to_string(&ticket.tags)?,
            ticket.updated_at.to_rfc3339(),
            ticket.resolved_at.map(|dt| dt.to_rfc3339()),
            ticket.id,
        ],
    )?;
    Ok(())
}

fn record_changes(ctx: &mut MutationContext, old: &Ticket, new: &Ticket) -> Result<()> {
    let id = new.id;
    if old.title != new.title {
        ctx.record_field_change(
            EventType::Updated,
            id,
            Some(old.title.clone()),
            Some(new.title.clone()),
            Some("title".to_string()),
        );
    }
    if old.description != new.description {
        ctx.record_field_change(
            EventType::Updated,
            id,
            Some(old.description.clone()),
            Some(new.description.clone()),
            Some("description".to_string()),
        );
    }
    if old.priority != new.priority {
        ctx.record_field_change(
            EventType::Updated,
            id,
            Some(old.priority.as_str().to_string()),
            Some(new.priority.as_str().to_string()),
            Some("priority".to_string()),
        );
    }
    if old.tags != new.tags {
        ctx.record_field_change(
            EventType::Updated,
            id,
            Some(serde_json::to_string(&old.tags)?),
            Some(serde_json::to_string(&new.tags)?),
            Some("tags".to_string()),
        );
    }
    Ok(())
}

fn title_taken(conn: &Connection, title: &str, exclude_id: Option<i64>) -> Result<bool> {
    let wanted = title.trim().to_lowercase();
    let mut stmt = conn.prepare("SELECT id, title FROM tickets")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        if Some(id) == exclude_id {
            continue;
        }
        let existing: String = row.get(1)?;
        if existing.trim().to_lowercase() == wanted {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ticket_from_row(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let tags: String = row.get(5)?;

    Ok(Ticket {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        status: status
            .parse::<Status>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        priority: priority
            .parse::<Priority>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        // A corrupt tags column reads as no tags rather than failing the row.
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
        resolved_at: row
            .get::<_, Option<String>>(8)?
            .as_deref()
            .map(parse_datetime),
    })
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Utc.from_utc_datetime(&naive);
    }

    Utc::now()
}
