//! Tracing setup for applications embedding the library.
//!
//! The library only emits events; nothing is printed until a subscriber is
//! installed. `RUST_LOG` always wins over the verbosity fallback:
//!
//! ```ignore
//! mnis::observability::init_tracing(1);
//! let result = mnis::score(&params, mnis::Biome::BorealConifer)?;
//! ```

use tracing_subscriber::EnvFilter;

/// Filter directive for a verbosity level (0 = warnings only)
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "mnis=warn",
        1 => "mnis=info",
        2 => "mnis=debug",
        _ => "mnis=trace",
    }
}

/// Install a fmt subscriber. Returns false if one was already installed.
pub fn init_tracing(verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
