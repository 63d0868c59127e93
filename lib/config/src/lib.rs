//! Configuration for the relay topology service: an optional config file
//! (`config` crate sources), layered with direct environment variable
//! overrides for the fields operators touch most often.

pub mod http_server;
pub mod log;
pub mod optimizer;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::{http_server::HttpServerConfig, log::LoggingConfig, optimizer::OptimizerConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TopologyServiceConfig {
    #[serde(default)]
    pub http: HttpServerConfig,
    #[serde(default)]
    pub log: LoggingConfig,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

impl TopologyServiceConfig {
    pub fn address(&self) -> String {
        self.http.address()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid LOG_LEVEL value: {0}")]
    InvalidLogLevel(String),
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
}

static DEFAULT_FILE_NAMES: &[&str] = &["topology.config.yaml", "topology.config.yml", "topology.config.json"];

/// Loads the optional config file (explicit path, or the first of
/// [`DEFAULT_FILE_NAMES`] found in the working directory), then applies
/// `HOST`/`PORT`/`LOG_LEVEL` environment variable overrides directly.
pub fn load_config(override_config_path: Option<&str>) -> Result<TopologyServiceConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = override_config_path {
        builder = builder.add_source(File::with_name(path).required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    let mut service_config = builder.build()?.try_deserialize::<TopologyServiceConfig>()?;
    apply_env_overrides(&mut service_config)?;
    Ok(service_config)
}

fn apply_env_overrides(config: &mut TopologyServiceConfig) -> Result<(), ConfigError> {
    if let Ok(host) = std::env::var("HOST") {
        config.http.host = host;
    }
    if let Ok(port) = std::env::var("PORT") {
        config.http.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
    }
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.log.level = log::LogLevel::parse(&level).ok_or(ConfigError::InvalidLogLevel(level))?;
    }
    Ok(())
}
