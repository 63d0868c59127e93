//! Delay-constrained multicast tree optimization over a
//! [`topology_graph::TopologyGraph`]: four single-track strategies plus a
//! multi-track optimizer composing or replacing them.

pub mod deadline;
pub mod multi;
pub mod solution;
pub mod solver;
pub mod track;

pub use deadline::Deadline;
pub use multi::MultiTrackOptimizerKind;
pub use solution::{MultiTrackSolution, SingleTrackSolution};
pub use solver::{SingleTrackOptimizer, SingleTrackOptimizerKind};
pub use track::{Stream, Track, TrackError};
