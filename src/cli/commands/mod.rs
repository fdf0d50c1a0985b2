//! Command implementations.
//!
//! Each command takes its parsed args and a [`CommandContext`] built once
//! from the global flags.

pub mod completions;
pub mod create;
pub mod delete;
pub mod init;
pub mod list;
pub mod serve;
pub mod show;
pub mod stats;
pub mod status;
pub mod update;

use crate::cli::Cli;
use crate::config::{self, CliOverrides, ConfigLayer};
use crate::error::{Result, TrackerError};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::debug;

/// Global flags every command sees.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub overrides: CliOverrides,
    pub json: bool,
    pub quiet: bool,
    pub use_color: bool,
}

impl CommandContext {
    /// Build from parsed CLI flags.
    ///
    /// A relative `--db` is resolved against the current directory, not the
    /// workspace.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let db = cli.db.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                env::current_dir().map_or_else(|_| path.clone(), |cwd| cwd.join(path))
            }
        });

        Self {
            overrides: CliOverrides {
                db,
                lock_timeout: cli.lock_timeout,
                ..CliOverrides::default()
            },
            json: cli.json,
            quiet: cli.quiet,
            use_color: !cli.no_color
                && env::var_os("NO_COLOR").is_none()
                && io::stdout().is_terminal(),
        }
    }

    /// Find the workspace and load the merged config.
    ///
    /// With an explicit `--db`, a missing workspace is not an error; the
    /// current directory stands in for it.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` when no workspace is found and no `--db` was
    /// given, or an error if a config file is unreadable.
    pub fn workspace(&self) -> Result<(PathBuf, ConfigLayer)> {
        let tix_dir = match config::discover_tix_dir(None) {
            Ok(dir) => dir,
            Err(TrackerError::NotInitialized) if self.overrides.db.is_some() => {
                env::current_dir()?
            }
            Err(err) => return Err(err),
        };
        debug!(path = %tix_dir.display(), "Using workspace");
        let layer = config::load_config(Some(&tix_dir), &self.overrides)?;
        Ok((tix_dir, layer))
    }

    /// Open the workspace database.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace or database cannot be found or opened.
    pub fn open_storage(&self) -> Result<(SqliteStorage, ConfigLayer)> {
        let (tix_dir, layer) = self.workspace()?;
        let storage = config::open_storage(&tix_dir, &layer)?;
        Ok((storage, layer))
    }

    /// Print a line unless `--quiet`.
    pub fn say(&self, line: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", line.as_ref());
        }
    }
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
