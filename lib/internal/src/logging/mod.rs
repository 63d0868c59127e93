pub mod stdout;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use topology_config::log::LoggingConfig;

use crate::logging::stdout::build_stdout_layer;

/// Installs the process-wide `tracing` subscriber. Intended to be called
/// once, at the very top of `main`.
pub fn init(config: &LoggingConfig) {
    let layer = build_stdout_layer(config);
    tracing_subscriber::registry().with(layer).init();
}
