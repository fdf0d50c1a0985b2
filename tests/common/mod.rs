#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tix::model::{NewTicket, Priority, Status, Ticket};
use tix::storage::SqliteStorage;
use tracing::info;

pub mod cli;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tix::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub fn test_db() -> SqliteStorage {
    init_test_logging();
    SqliteStorage::open_memory().expect("Failed to create test database")
}

pub fn test_db_with_dir() -> (SqliteStorage, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join(".tix").join("tix.db");
    std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();
    let storage = SqliteStorage::open(&db_path).expect("Failed to create test database");
    (storage, dir)
}

pub fn new_ticket(title: &str, description: &str, priority: Priority) -> NewTicket {
    NewTicket {
        title: title.to_string(),
        description: description.to_string(),
        priority,
        tags: Vec::new(),
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()
}

/// In-memory snapshot for pure lifecycle/query tests.
pub fn snapshot(id: i64, status: Status, priority: Priority, minutes: i64) -> Ticket {
    let created = base_time() + Duration::minutes(minutes);
    Ticket {
        id,
        title: format!("Ticket {id}"),
        description: String::new(),
        status,
        priority,
        tags: Vec::new(),
        created_at: created,
        updated_at: created,
        resolved_at: status.is_resolved().then_some(created),
    }
}
