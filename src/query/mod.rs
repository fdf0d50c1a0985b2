//! Ticket filtering, ordering and pagination.
//!
//! [`evaluate`] is a pure function over a ticket collection. Storage uses it
//! after a coarse SQL prefilter so the CLI, the API and the tests all share
//! one set of ordering rules.

use crate::error::{Result, TrackerError};
use crate::model::{Priority, Status, Ticket};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Largest page size accepted.
pub const MAX_PAGE_LIMIT: usize = 100;

/// Sort key for ticket listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
    Priority,
    Status,
}

impl OrderBy {
    pub const ALL: [Self; 5] = [
        Self::CreatedAt,
        Self::UpdatedAt,
        Self::Title,
        Self::Priority,
        Self::Status,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Priority => "priority",
            Self::Status => "status",
        }
    }

    /// Parse a sort key, falling back to `created_at` for unknown keys.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "created_at" | "created" => Ok(Self::CreatedAt),
            "updated_at" | "updated" => Ok(Self::UpdatedAt),
            "title" => Ok(Self::Title),
            "priority" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            _ => Err(TrackerError::InvalidOrderBy { key: s.to_string() }),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDir {
    Asc,
    #[default]
    Desc,
}

impl OrderDir {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// `asc` (any case) is ascending; everything else is descending.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

impl fmt::Display for OrderDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter, ordering and page selection for a ticket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// Exact tag the ticket must carry.
    pub tag: Option<String>,
    pub order_by: OrderBy,
    pub order_dir: OrderDir,
    pub page: usize,
    pub limit: usize,
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            search: None,
            tag: None,
            order_by: OrderBy::default(),
            order_dir: OrderDir::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl TicketQuery {
    /// Lowercased search needle, or `None` when no search applies.
    #[must_use]
    pub fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Does `ticket` pass every filter of this query?
    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.matches_with(ticket, self.search_needle().as_deref())
    }

    fn matches_with(&self, ticket: &Ticket, needle: Option<&str>) -> bool {
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != ticket.priority) {
            return false;
        }
        if let Some(tag) = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !ticket.has_tag(tag) {
                return false;
            }
        }
        needle.is_none_or(|needle| {
            ticket.title.to_lowercase().contains(needle)
                || ticket.description.to_lowercase().contains(needle)
        })
    }

    /// Check page and limit bounds.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `page` is 0 or `limit` is outside
    /// `1..=MAX_PAGE_LIMIT`.
    pub fn validate(&self) -> Result<()> {
        validate_page(self.page, self.limit)
    }

    /// Order two tickets by this query's key and direction.
    ///
    /// Ties fall back to `created_at` ascending, then `id` ascending,
    /// whatever the direction.
    #[must_use]
    pub fn compare(&self, a: &Ticket, b: &Ticket) -> Ordering {
        let primary = match self.order_by {
            OrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            OrderBy::Priority => a.priority.cmp(&b.priority),
            OrderBy::Status => a.status.cmp(&b.status),
        };
        let primary = match self.order_dir {
            OrderDir::Asc => primary,
            OrderDir::Desc => primary.reverse(),
        };
        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Filter and order `tickets` according to `query`.
///
/// Pagination is not applied; see [`paginate`].
#[must_use]
pub fn evaluate(tickets: Vec<Ticket>, query: &TicketQuery) -> Vec<Ticket> {
    let needle = query.search_needle();
    let mut matched: Vec<Ticket> = tickets
        .into_iter()
        .filter(|t| query.matches_with(t, needle.as_deref()))
        .collect();
    matched.sort_by(|a, b| query.compare(a, b));
    matched
}

/// Page metadata returned with a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

/// One page of tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketPage {
    pub tickets: Vec<Ticket>,
    pub pagination: Pagination,
}

fn validate_page(page: usize, limit: usize) -> Result<()> {
    if page < 1 {
        return Err(TrackerError::validation("page", "must be at least 1"));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(TrackerError::validation(
            "limit",
            format!("must be between 1 and {MAX_PAGE_LIMIT}"),
        ));
    }
    Ok(())
}

/// Slice an ordered ticket list into one page.
///
/// Pages past the end are empty; `pages` is `ceil(total / limit)`.
///
/// # Errors
///
/// Returns a validation error for out-of-range `page` or `limit`.
pub fn paginate(tickets: Vec<Ticket>, page: usize, limit: usize) -> Result<TicketPage> {
    validate_page(page, limit)?;

    let total = tickets.len();
    let pages = total.div_ceil(limit);
    let offset = (page - 1).saturating_mul(limit);
    let tickets = tickets.into_iter().skip(offset).take(limit).collect();

    Ok(TicketPage {
        tickets,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    })
}

/// Filter, order and paginate in one step.
///
/// # Errors
///
/// Returns a validation error for out-of-range `page` or `limit`.
pub fn run(tickets: Vec<Ticket>, query: &TicketQuery) -> Result<TicketPage> {
    query.validate()?;
    paginate(evaluate(tickets, query), query.page, query.limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap()
    }

    fn ticket(id: i64, title: &str, priority: Priority, minutes: i64) -> Ticket {
        let at = base() + Duration::minutes(minutes);
        Ticket {
            id,
            title: title.to_string(),
            description: String::new(),
            status: Status::Open,
            priority,
            tags: Vec::new(),
            created_at: at,
            updated_at: at,
            resolved_at: None,
        }
    }

    fn ids(tickets: &[Ticket]) -> Vec<i64> {
        tickets.iter().map(|t| t.id).collect()
    }

    #[test]
    fn priority_desc_puts_high_first() {
        let tickets = vec![
            ticket(1, "Low one", Priority::Low, 0),
            ticket(2, "High one", Priority::High, 1),
            ticket(3, "Medium one", Priority::Medium, 2),
        ];
        let query = TicketQuery {
            order_by: OrderBy::Priority,
            order_dir: OrderDir::Desc,
            ..Default::default()
        };
        assert_eq!(ids(&evaluate(tickets, &query)), vec![2, 3, 1]);
    }

    #[test]
    fn search_matches_description_case_insensitively() {
        let mut with_desc = ticket(1, "Login broken", Priority::Low, 0);
        with_desc.description = "The AUTH service returns 500".to_string();
        let tickets = vec![with_desc, ticket(2, "Printer", Priority::Low, 1)];
        let query = TicketQuery {
            search: Some("auth".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&evaluate(tickets, &query)), vec![1]);
    }

    #[test]
    fn blank_search_is_no_filter() {
        let tickets = vec![ticket(1, "A ticket", Priority::Low, 0)];
        let query = TicketQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(evaluate(tickets, &query).len(), 1);
    }

    #[test]
    fn exact_status_priority_and_tag_filters() {
        let mut a = ticket(1, "First", Priority::High, 0);
        a.tags = vec!["ui".to_string()];
        let mut b = ticket(2, "Second", Priority::High, 1);
        b.status = Status::InProgress;
        let c = ticket(3, "Third", Priority::Low, 2);

        let query = TicketQuery {
            status: Some(Status::Open),
            priority: Some(Priority::High),
            ..Default::default()
        };
        assert_eq!(
            ids(&evaluate(vec![a.clone(), b.clone(), c.clone()], &query)),
            vec![1]
        );

        let query = TicketQuery {
            tag: Some("ui".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&evaluate(vec![a, b, c], &query)), vec![1]);
    }

    #[test]
    fn ties_break_on_created_at_then_id() {
        let tickets = vec![
            ticket(3, "c", Priority::High, 5),
            ticket(1, "a", Priority::High, 5),
            ticket(2, "b", Priority::High, 0),
        ];
        for dir in [OrderDir::Asc, OrderDir::Desc] {
            let query = TicketQuery {
                order_by: OrderBy::Priority,
                order_dir: dir,
                ..Default::default()
            };
            assert_eq!(ids(&evaluate(tickets.clone(), &query)), vec![2, 1, 3]);
        }
    }

    #[test]
    fn title_order_ignores_case() {
        let tickets = vec![
            ticket(1, "banana", Priority::Low, 0),
            ticket(2, "Apple", Priority::Low, 1),
            ticket(3, "cherry", Priority::Low, 2),
        ];
        let query = TicketQuery {
            order_by: OrderBy::Title,
            order_dir: OrderDir::Asc,
            ..Default::default()
        };
        assert_eq!(ids(&evaluate(tickets, &query)), vec![2, 1, 3]);
    }

    #[test]
    fn default_order_is_newest_first() {
        let tickets = vec![
            ticket(1, "old", Priority::Low, 0),
            ticket(2, "new", Priority::Low, 10),
        ];
        assert_eq!(
            ids(&evaluate(tickets, &TicketQuery::default())),
            vec![2, 1]
        );
    }

    #[test]
    fn lenient_parsing_falls_back() {
        assert_eq!(OrderBy::parse_lenient("PRIORITY"), OrderBy::Priority);
        assert_eq!(OrderBy::parse_lenient("drop table"), OrderBy::CreatedAt);
        assert_eq!(OrderDir::parse_lenient("ASC"), OrderDir::Asc);
        assert_eq!(OrderDir::parse_lenient("sideways"), OrderDir::Desc);
        assert!("bogus".parse::<OrderBy>().is_err());
    }

    #[test]
    fn paginate_slices_and_counts() {
        let tickets: Vec<Ticket> = (1..=25)
            .map(|i| ticket(i, &format!("Ticket {i}"), Priority::Low, i))
            .collect();
        let page = paginate(tickets.clone(), 3, 10).unwrap();
        assert_eq!(ids(&page.tickets), (21..=25).collect::<Vec<_>>());
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.pages, 3);

        let past_end = paginate(tickets, 9, 10).unwrap();
        assert!(past_end.tickets.is_empty());
        assert_eq!(past_end.pagination.pages, 3);
    }

    #[test]
    fn paginate_rejects_bad_bounds() {
        assert!(paginate(Vec::new(), 0, 10).is_err());
        assert!(paginate(Vec::new(), 1, 0).is_err());
        assert!(paginate(Vec::new(), 1, 101).is_err());
        let empty = paginate(Vec::new(), 1, 100).unwrap();
        assert_eq!(empty.pagination.pages, 0);
    }
}
