//! Handlers for `/health` and `/tickets`.
//!
//! Request bodies carry enums as plain strings and parse them here, so a bad
//! `status` or `priority` becomes a 400 with the usual error body instead of
//! an extractor rejection.

use super::AppState;
use super::error::ApiError;
use crate::error::{Result, TrackerError};
use crate::format::DeleteResponse;
use crate::lifecycle::TransitionRequest;
use crate::model::{Event, NewTicket, Priority, Status, Ticket, TicketStats, TicketUpdate};
use crate::query::{OrderBy, OrderDir, TicketPage, TicketQuery};
use crate::storage::SqliteStorage;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::str::FromStr;
use std::sync::MutexGuard;
use tracing::debug;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Query string for `GET /tickets`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub order_by: Option<String>,
    pub order_dir: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ListParams {
    /// Build a query, parsing enums strictly and ordering leniently.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatus` or `InvalidPriority` for unknown filter values.
    pub fn into_query(self, default_limit: usize) -> Result<TicketQuery> {
        Ok(TicketQuery {
            status: parse_optional::<Status>(self.status.as_deref())?,
            priority: parse_optional::<Priority>(self.priority.as_deref())?,
            search: self.search,
            tag: self.tag,
            order_by: self
                .order_by
                .as_deref()
                .map(OrderBy::parse_lenient)
                .unwrap_or_default(),
            order_dir: self
                .order_dir
                .as_deref()
                .map(OrderDir::parse_lenient)
                .unwrap_or_default(),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(default_limit),
        })
    }
}

/// Body of `POST /tickets`.
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Body of `PUT /tickets/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTicketBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateTicketBody {
    fn into_update(self) -> Result<TicketUpdate> {
        Ok(TicketUpdate {
            title: self.title,
            description: self.description,
            priority: parse_optional::<Priority>(self.priority.as_deref())?,
            tags: self.tags,
        })
    }
}

/// Body of `PATCH /tickets/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
    pub reason: Option<String>,
}

/// Empty strings count as absent, which is what form-driven clients send.
fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = TrackerError>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(T::from_str)
        .transpose()
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, SqliteStorage>> {
    state
        .storage
        .lock()
        .map_err(|_| TrackerError::Other(anyhow::anyhow!("storage lock poisoned")))
}

/// GET /health
pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /tickets
pub(super) async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TicketPage>> {
    let query = params.into_query(state.page_size)?;
    debug!(?query, "Listing tickets");
    let page = lock(&state)?.list_tickets(&query)?;
    Ok(Json(page))
}

/// POST /tickets
pub(super) async fn create_ticket(
    State(state): State<AppState>,
    Json(body): Json<CreateTicketBody>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    let priority =
        parse_optional::<Priority>(body.priority.as_deref())?.unwrap_or(state.default_priority);
    let new = NewTicket {
        title: body.title,
        description: body.description,
        priority,
        tags: body.tags,
    };
    let ticket = lock(&state)?.create_ticket(&new)?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /tickets/stats
pub(super) async fn ticket_stats(State(state): State<AppState>) -> ApiResult<Json<TicketStats>> {
    Ok(Json(lock(&state)?.stats()?))
}

/// GET /tickets/{id}
pub(super) async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Ticket>> {
    Ok(Json(lock(&state)?.require_ticket(id)?))
}

/// GET /tickets/{id}/events
pub(super) async fn ticket_events(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(lock(&state)?.get_events(id)?))
}

/// PUT /tickets/{id}
pub(super) async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTicketBody>,
) -> ApiResult<Json<Ticket>> {
    let update = body.into_update()?;
    Ok(Json(lock(&state)?.update_ticket(id, &update)?))
}

/// PATCH /tickets/{id}/status
pub(super) async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Ticket>> {
    let request = TransitionRequest {
        status: body.status.parse()?,
        reason: body.reason,
    };
    Ok(Json(lock(&state)?.set_status(id, &request)?))
}

/// DELETE /tickets/{id}
pub(super) async fn delete_ticket(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    lock(&state)?.delete_ticket(id)?;
    Ok(Json(DeleteResponse::new(id)))
}
