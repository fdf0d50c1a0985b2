//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Small ticket tracker (`SQLite` + REST API)
#[derive(Parser, Debug)]
#[command(name = "tix", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: .tix/tix.db in the discovered workspace)
    #[arg(long, global = true, env = "TIX_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a tix workspace in the current directory
    Init {
        /// Recreate the database even if one exists
        #[arg(long)]
        force: bool,
    },

    /// Create a new ticket
    Create(CreateArgs),

    /// List tickets
    List(ListArgs),

    /// Show ticket details, legal next statuses and history
    Show {
        /// Ticket ID
        id: i64,
    },

    /// Update a ticket's title, description, priority or tags
    Update(UpdateArgs),

    /// Change a ticket's status
    Status(StatusArgs),

    /// Delete a ticket
    Delete {
        /// Ticket ID
        id: i64,
    },

    /// Show ticket counts per status
    Stats,

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the completions command.
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    Elvish,
}

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Ticket title
    pub title: String,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Priority (low, medium, high)
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Tag (repeatable, or comma-separated)
    #[arg(long = "tag", short = 't', value_delimiter = ',')]
    pub tags: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by priority
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Case-insensitive text in title or description
    #[arg(long)]
    pub search: Option<String>,

    /// Only tickets carrying this tag
    #[arg(long, short = 't')]
    pub tag: Option<String>,

    /// Sort key (created_at, updated_at, title, priority, status)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort ascending (default: descending)
    #[arg(long, visible_alias = "reverse")]
    pub asc: bool,

    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<usize>,

    /// Tickets per page (max 100)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Ticket ID
    pub id: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// New priority
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Replace tags (repeatable, or comma-separated)
    #[arg(long = "tag", short = 't', value_delimiter = ',', conflicts_with = "clear_tags")]
    pub tags: Vec<String>,

    /// Remove all tags
    #[arg(long)]
    pub clear_tags: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Ticket ID
    pub id: i64,

    /// Target status (open, in_progress, resolved)
    pub status: String,

    /// Reason for the change (required when reopening a resolved ticket)
    #[arg(long, short = 'r')]
    pub reason: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (default: server.host from config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default: server.port from config)
    #[arg(long)]
    pub port: Option<u16>,
}
