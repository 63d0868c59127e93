use std::time::Duration;

use serde::{Deserialize, Serialize};
use topology_optimizer::SingleTrackOptimizerKind;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerConfig {
    #[serde(default)]
    pub default_kind: SingleTrackOptimizerKind,

    /// Soft deadline past which an in-flight solve is cancelled.
    #[serde(default = "default_solve_timeout", with = "humantime_serde")]
    pub solve_timeout: Duration,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            default_kind: SingleTrackOptimizerKind::default(),
            solve_timeout: default_solve_timeout(),
        }
    }
}

fn default_solve_timeout() -> Duration {
    Duration::from_secs(5)
}
