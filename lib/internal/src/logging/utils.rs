use topology_config::log::LogLevel;
use tracing_subscriber::{filter::Targets, Layer};

/// Crates noisy enough at `debug`/`trace` that they're worth silencing
/// independently of the service's own log level.
static INTERNAL_CRATES: &[&str] = &["ntex_server", "ntex_rt", "ntex_service", "ntex_net", "ntex_io", "ntex"];

pub fn create_env_filter(log_level: LogLevel) -> Targets {
    let level_filter = match log_level {
        LogLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        LogLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
        LogLevel::Info => tracing::level_filters::LevelFilter::INFO,
        LogLevel::Warn => tracing::level_filters::LevelFilter::WARN,
        LogLevel::Error => tracing::level_filters::LevelFilter::ERROR,
    };

    Targets::new()
        .with_targets(
            INTERNAL_CRATES
                .iter()
                .map(|crate_name| (*crate_name, tracing::level_filters::LevelFilter::WARN)),
        )
        .with_default(level_filter)
}

pub type DynLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;
