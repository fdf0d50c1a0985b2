//! `SQLite` persistence for tickets and their audit events.

pub mod events;
pub mod schema;
pub mod sqlite;

pub use sqlite::{MutationContext, SqliteStorage};
