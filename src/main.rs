use clap::Parser;
use std::io::{self, IsTerminal};
use tix::cli::commands::{self, CommandContext};
use tix::cli::{Cli, Commands};
use tix::logging::init_logging;
use tix::{StructuredError, TrackerError};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ctx = CommandContext::from_cli(&cli);

    let result = match cli.command {
        Commands::Init { force } => commands::init::execute(force, None, &ctx),
        Commands::Create(args) => commands::create::execute(args, &ctx),
        Commands::List(args) => commands::list::execute(&args, &ctx),
        Commands::Show { id } => commands::show::execute(id, &ctx),
        Commands::Update(args) => commands::update::execute(args, &ctx),
        Commands::Status(args) => commands::status::execute(&args, &ctx),
        Commands::Delete { id } => commands::delete::execute(id, &ctx),
        Commands::Stats => commands::stats::execute(&ctx),
        Commands::Serve(args) => commands::serve::execute(&args, &ctx),
        Commands::Completions(args) => commands::completions::execute(&args),
    };

    if let Err(e) = result {
        handle_error(&e, ctx.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs a human-readable error with optional color.
fn handle_error(err: &TrackerError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}
