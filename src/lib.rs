//! `tix`: a small ticket tracker.
//!
//! Tickets live in a `SQLite` database inside a `.tix/` workspace and are
//! reachable through the `tix` CLI or an HTTP API (`tix serve`). The status
//! rules live in [`lifecycle`]; listing semantics live in [`query`]. Both are
//! pure and shared by every front end.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod query;
pub mod server;
pub mod storage;
pub mod validation;

pub use error::{ErrorCode, Result, StructuredError, TrackerError};
