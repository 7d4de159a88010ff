//! Diagnostics on stderr.
//!
//! Level priority: `RUST_LOG` > `--debug` > `warn`. Stdout is never written,
//! so the tool stays quiet inside a shell pipeline unless asked otherwise.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "warn";

pub fn init(debug_flag: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .compact()
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialised");
}
