use std::io::IsTerminal;

use tracing_subscriber::{fmt::time::UtcTime, Layer};
use topology_config::log::{LogFormat, LoggingConfig};

use crate::logging::utils::{create_env_filter, DynLayer};

pub fn build_stdout_layer<S>(config: &LoggingConfig) -> DynLayer<S>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span> + Send + Sync,
{
    let is_terminal = std::io::stdout().is_terminal();
    let filter = create_env_filter(config.level);
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);
    let timer = UtcTime::rfc_3339();

    match config.format {
        LogFormat::Json => layer
            .json()
            .with_timer(timer)
            .with_thread_ids(false)
            .with_target(false)
            .with_ansi(is_terminal)
            .flatten_event(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => layer
            .compact()
            .with_thread_ids(false)
            .with_timer(timer)
            .with_target(false)
            .with_ansi(is_terminal)
            .with_filter(filter)
            .boxed(),
    }
}
