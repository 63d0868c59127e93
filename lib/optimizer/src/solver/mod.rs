pub mod direct_link_tree;
pub mod ilp;
pub mod mst;
pub mod multicast_heuristic;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{deadline::Deadline, solution::SingleTrackSolution, track::Track};
use topology_graph::TopologyGraph;

/// Common entry point shared by all four single-track strategies.
pub trait SingleTrackOptimizer {
    fn solve(&self, graph: &TopologyGraph, track: &Track, deadline: Deadline) -> SingleTrackSolution;
}

/// A tagged identity for one of the four optimizer strategies, plus the
/// factory (`build`) that turns it into a callable optimizer. This is the
/// "runtime-dispatched optimizer selection" seam: callers hold a `Kind` they
/// can serialize/pass over HTTP, and resolve it to an implementation lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SingleTrackOptimizerKind {
    DirectLinkTree,
    MulticastHeuristic,
    IntegerLinearProgramming,
    MinimumSpanningTree,
}

impl Default for SingleTrackOptimizerKind {
    fn default() -> Self {
        Self::IntegerLinearProgramming
    }
}

impl SingleTrackOptimizerKind {
    pub fn build(&self) -> Box<dyn SingleTrackOptimizer> {
        match self {
            Self::DirectLinkTree => Box::new(direct_link_tree::DirectLinkTree),
            Self::MulticastHeuristic => Box::new(multicast_heuristic::MulticastHeuristic),
            Self::IntegerLinearProgramming => Box::new(ilp::IntegerLinearProgramming::default()),
            Self::MinimumSpanningTree => Box::new(mst::MinimumSpanningTree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_strum() {
        for kind in [
            SingleTrackOptimizerKind::DirectLinkTree,
            SingleTrackOptimizerKind::MulticastHeuristic,
            SingleTrackOptimizerKind::IntegerLinearProgramming,
            SingleTrackOptimizerKind::MinimumSpanningTree,
        ] {
            let parsed: SingleTrackOptimizerKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn default_kind_is_ilp() {
        assert_eq!(
            SingleTrackOptimizerKind::default(),
            SingleTrackOptimizerKind::IntegerLinearProgramming
        );
    }
}
