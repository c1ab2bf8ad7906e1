pub mod breakout;
pub mod collect;
pub mod config;
pub mod fake_source;
pub mod http_client;
pub mod lag_features;
pub mod merge;
pub mod nba_stats;
pub mod panel;
pub mod panel_csv;
pub mod panel_store;
pub mod pipeline;
pub mod season;
pub mod table;

use tracing_subscriber::EnvFilter;

/// Stdout logging for the binaries; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
