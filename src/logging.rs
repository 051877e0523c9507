//! Diagnostic logging to stderr; stdout is reserved for the problem report.

use std::io::IsTerminal;
use tracing::Level;

/// Install the global subscriber: debug output with `--verbose`, warnings otherwise
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    // A second initialization (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .try_init();
}
