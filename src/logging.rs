//! Logging setup for hosts embedding the engine
//!
//! The engine itself only emits `tracing` events; installing a subscriber is
//! the host's choice. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global fmt subscriber. Returns false if one was already set.
pub fn init(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("polyparse=debug")
        } else {
            EnvFilter::new("polyparse=info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok()
}
