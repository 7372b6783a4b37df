//! Tracing subscriber setup for the dirgraph binary.
//!
//! Filter priority, highest first:
//!
//! 1. `DIRGRAPH_LOG` (per-target directives, e.g. `dirgraph_ingest=debug,warn`)
//! 2. `RUST_LOG`
//! 3. `-v` (debug) or `-q` (error)
//! 4. `info`

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Verbosity derived from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    /// Filter directive used when no environment override is set.
    pub const fn default_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "info",
            Self::Verbose => "debug",
        }
    }
}

/// Install the global subscriber writing to stderr.
///
/// Panics if a global subscriber is already set.
pub fn init(verbosity: Verbosity) {
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(use_ansi)
                .with_target(false),
        )
        .with(env_filter(verbosity))
        .init();
}

fn env_filter(verbosity: Verbosity) -> EnvFilter {
    for var in ["DIRGRAPH_LOG", "RUST_LOG"] {
        let Ok(directives) = std::env::var(var) else {
            continue;
        };
        if directives.trim().is_empty() {
            continue;
        }
        match EnvFilter::try_new(&directives) {
            Ok(filter) => return filter,
            Err(err) => eprintln!("ignoring invalid {var}={directives:?}: {err}"),
        }
    }
    EnvFilter::new(verbosity.default_directive())
}
