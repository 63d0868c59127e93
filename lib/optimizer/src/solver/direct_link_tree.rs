use topology_graph::TopologyGraph;

use crate::{deadline::Deadline, solution::SingleTrackSolution, track::Track};

use super::SingleTrackOptimizer;

/// Star topology rooted at the publisher: every subscriber is reached
/// directly. Cheapest to compute, usually the most expensive in `cost`.
pub struct DirectLinkTree;

impl SingleTrackOptimizer for DirectLinkTree {
    fn solve(&self, graph: &TopologyGraph, track: &Track, _deadline: Deadline) -> SingleTrackSolution {
        let mut cost = 0.0;
        let mut max_delay = 0.0;
        let mut used_links = Vec::with_capacity(track.subscribers().len());

        for subscriber in track.subscribers() {
            let Some(edge) = graph.get_edge(track.publisher(), subscriber) else {
                return SingleTrackSolution::not_found();
            };
            if edge.latency > track.delay_budget() {
                return SingleTrackSolution::not_found();
            }
            cost += edge.cost;
            max_delay = f64::max(max_delay, edge.latency);
            used_links.push((track.publisher().to_string(), subscriber.clone()));
        }

        SingleTrackSolution::found(cost, max_delay, used_links)
    }
}
