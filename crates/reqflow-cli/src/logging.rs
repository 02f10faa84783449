//! Tracing subscriber setup
//!
//! `RUST_LOG` selects the filter, `info` when unset.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Logs go to stderr so command output on stdout stays parseable.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
