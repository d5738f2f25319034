//! Tracing subscriber setup
//!
//! Filter comes from `RUST_LOG` (default `info`); output always goes to stderr
//! so stdout stays clean for documents and JSON.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber; later calls are no-ops
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
