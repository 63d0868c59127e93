use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The result of solving one track: a directed out-tree rooted at the
/// publisher, or an explicit failure.
///
/// `success = false` always comes with zeroed numeric fields and an empty
/// `used_links`, constructed only through [`SingleTrackSolution::not_found`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleTrackSolution {
    pub success: bool,
    pub cost: f64,
    pub max_delay: f64,
    pub used_links: Vec<(String, String)>,
}

impl SingleTrackSolution {
    pub fn found(cost: f64, max_delay: f64, used_links: Vec<(String, String)>) -> Self {
        Self {
            success: true,
            cost,
            max_delay,
            used_links,
        }
    }

    pub fn not_found() -> Self {
        Self {
            success: false,
            cost: 0.0,
            max_delay: 0.0,
            used_links: Vec::new(),
        }
    }

    /// The unique predecessor of `subscriber` in `used_links`, if any.
    pub fn next_hop(&self, subscriber: &str) -> Option<&str> {
        self.used_links
            .iter()
            .find(|(_, to)| to == subscriber)
            .map(|(from, _)| from.as_str())
    }
}

/// Aggregate over a map of `namespace -> SingleTrackSolution`.
///
/// `explicit_success` lets a combined (native) solve report infeasibility
/// without fabricating a map of per-track failures, mirroring the
/// `explicit_success` flag in the original Python `MultiTrackSolution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiTrackSolution {
    explicit_success: bool,
    solutions: BTreeMap<String, SingleTrackSolution>,
}

impl MultiTrackSolution {
    pub fn found(solutions: BTreeMap<String, SingleTrackSolution>) -> Self {
        Self {
            explicit_success: true,
            solutions,
        }
    }

    pub fn not_found() -> Self {
        Self {
            explicit_success: false,
            solutions: BTreeMap::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.explicit_success && self.solutions.values().all(|solution| solution.success)
    }

    pub fn cost(&self) -> f64 {
        if !self.explicit_success {
            return 0.0;
        }
        self.solutions.values().map(|solution| solution.cost).sum()
    }

    pub fn max_delay(&self) -> f64 {
        if !self.explicit_success {
            return 0.0;
        }
        self.solutions
            .values()
            .map(|solution| solution.max_delay)
            .fold(0.0, f64::max)
    }

    pub fn solutions(&self) -> &BTreeMap<String, SingleTrackSolution> {
        &self.solutions
    }
}
