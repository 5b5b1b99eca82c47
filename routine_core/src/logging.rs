//! Tracing setup for routine-import.
//!
//! stdout carries the interactive menus and the import summary, so every log
//! line goes to stderr where it cannot interleave with a prompt.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber at INFO, or whatever RUST_LOG asks for
///
/// INFO reports which backups were opened, every reconciliation decision and
/// the final commit or rollback. DEBUG adds one line per inserted row.
pub fn init() {
    init_with_level("info")
}

fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route logs through the test harness at DEBUG; safe to call from every test
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
