//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for command output and `--json`.
//! `RUST_LOG` wins over the verbosity flags when set. `TIX_LOG_FORMAT=json`
//! switches to one JSON object per line.

use std::env;
use std::io::{self, IsTerminal};
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable selecting the log format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "TIX_LOG_FORMAT";

/// Directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_directive(verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    let level = match verbose {
        0 => return "warn".to_string(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,tix={level}")
}

fn json_requested() -> bool {
    env::var(LOG_FORMAT_ENV).is_ok_and(|value| value.trim().eq_ignore_ascii_case("json"))
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_logging(verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json_requested() {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_ansi(io::stderr().is_terminal())
                    .with_target(verbose > 1),
            )
            .try_init()?;
    }

    Ok(())
}

static TEST_INIT: Once = Once::new();

/// Install a test-writer subscriber once per process.
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        let _ = fmt()
            .with_test_writer()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tix=debug")),
            )
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_directives() {
        assert_eq!(default_directive(0, false), "warn");
        assert_eq!(default_directive(1, false), "warn,tix=info");
        assert_eq!(default_directive(2, false), "warn,tix=debug");
        assert_eq!(default_directive(5, false), "warn,tix=trace");
        assert_eq!(default_directive(3, true), "error");
    }

    #[test]
    fn test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::debug!("still alive");
    }
}
