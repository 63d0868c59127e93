use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::min_spanning_tree;
use petgraph::data::FromElements;
use petgraph::graph::{NodeIndex, UnGraph};

use topology_graph::{Edge, TopologyGraph};

use crate::{deadline::Deadline, solution::SingleTrackSolution, track::Track};

use super::SingleTrackOptimizer;

/// Cost-optimal tree ignoring the delay budget at construction time; a
/// track is only accepted if the resulting tree happens to respect it.
/// Cheapest of the three non-trivial strategies, often infeasible.
pub struct MinimumSpanningTree;

impl SingleTrackOptimizer for MinimumSpanningTree {
    fn solve(&self, graph: &TopologyGraph, track: &Track, _deadline: Deadline) -> SingleTrackSolution {
        if track.subscribers().is_empty() {
            return SingleTrackSolution::found(0.0, 0.0, Vec::new());
        }

        let mut scope: Vec<String> = track.subscribers().iter().cloned().collect();
        scope.push(track.publisher().to_string());
        scope.sort();
        scope.dedup();

        let mut index_of: HashMap<String, NodeIndex> = HashMap::new();
        let mut undirected: UnGraph<(), f64, u32> = UnGraph::default();
        for id in &scope {
            index_of.insert(id.clone(), undirected.add_node(()));
        }
        for (i, u) in scope.iter().enumerate() {
            for v in &scope[i + 1..] {
                if let Some(edge) = undirected_edge(graph, u, v) {
                    undirected.add_edge(index_of[u], index_of[v], edge.cost);
                }
            }
        }

        let mst = UnGraph::<(), f64, u32>::from_elements(min_spanning_tree(&undirected));

        let root = index_of[track.publisher()];
        let mut latencies: HashMap<String, f64> = HashMap::new();
        latencies.insert(track.publisher().to_string(), 0.0);
        let mut cost = 0.0;
        let mut max_delay = 0.0;
        let mut used_links = Vec::new();

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        visited.insert(root);
        let mut queue = VecDeque::new();
        queue.push_back(root);

        let id_of = |index: NodeIndex| scope[index.index()].clone();

        while let Some(current) = queue.pop_front() {
            let current_id = id_of(current);
            for neighbor in mst.neighbors(current) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let neighbor_id = id_of(neighbor);
                let Some(edge) = undirected_edge(graph, &current_id, &neighbor_id) else {
                    continue;
                };

                cost += edge.cost;
                let latency = latencies[&current_id] + edge.latency;
                latencies.insert(neighbor_id.clone(), latency);
                max_delay = f64::max(max_delay, latency);
                if max_delay > track.delay_budget() {
                    return SingleTrackSolution::not_found();
                }
                used_links.push((current_id.clone(), neighbor_id.clone()));
                queue.push_back(neighbor);
            }
        }

        if !track.subscribers().iter().all(|subscriber| latencies.contains_key(subscriber)) {
            return SingleTrackSolution::not_found();
        }

        SingleTrackSolution::found(cost, max_delay, used_links)
    }
}

/// Edge data between `u` and `v` regardless of direction, since the MST is
/// built over the network's undirected shadow.
fn undirected_edge(graph: &TopologyGraph, u: &str, v: &str) -> Option<Edge> {
    graph.get_edge(u, v).or_else(|| graph.get_edge(v, u))
}
