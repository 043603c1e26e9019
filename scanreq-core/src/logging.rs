//! Structured logging via **tracing**.
//!
//! Log events go to stderr as JSON so that stdout carries only the scan
//! report. Filtering is controlled with `RUST_LOG` (e.g. `RUST_LOG=scanreq_core=debug`).

use tracing::{error, info};

/// Initializes the global tracing subscriber.
///
/// Call once at program start. Later calls are ignored rather than
/// panicking, so tests and embedders may call it freely.
pub fn init_structured_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs an info event.
pub fn log_info(message: &str) {
    info!(detail = %message);
}

/// Logs an error event.
pub fn log_error(message: &str) {
    error!(detail = %message);
}
