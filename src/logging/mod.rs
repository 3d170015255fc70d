// Logging: tracing subscriber setup and the durable critique log
//
// Progress and outcomes go through `tracing`. Every critique is additionally
// appended to a JSONL file when `[pipeline] critique_log` is set.

use tracing_subscriber::EnvFilter;

pub mod critique_logger;

pub use critique_logger::{CritiqueLogEntry, CritiqueLogger};

/// Install the fmt subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "adforge=debug" } else { "adforge=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed (tests, embedding callers)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
