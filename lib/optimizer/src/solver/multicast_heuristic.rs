use std::collections::{HashMap, HashSet, VecDeque};

use topology_graph::TopologyGraph;

use crate::{deadline::Deadline, solution::SingleTrackSolution, track::Track};

use super::SingleTrackOptimizer;

/// Greedy out-tree construction with a local re-routing ("augment") pass
/// after every attach. Approximately optimal in cost while respecting the
/// delay budget; cheaper to compute than the exact ILP.
pub struct MulticastHeuristic;

impl SingleTrackOptimizer for MulticastHeuristic {
    fn solve(&self, graph: &TopologyGraph, track: &Track, deadline: Deadline) -> SingleTrackSolution {
        let mut tree = GrowingTree::new(track.publisher());
        let mut cost = 0.0;

        let mut subscribers: Vec<&String> = track.subscribers().iter().collect();
        subscribers.sort();

        for subscriber in subscribers {
            if deadline.expired() {
                return SingleTrackSolution::not_found();
            }
            let Some(connection_node) =
                attach(graph, track.delay_budget(), &mut tree, subscriber)
            else {
                return SingleTrackSolution::not_found();
            };
            let edge = graph.get_edge(&connection_node, subscriber).expect("just looked up");
            cost += edge.cost;

            augment(graph, track.delay_budget(), &mut tree, &mut cost, subscriber);
        }

        let max_delay = tree.lat.values().cloned().fold(0.0_f64, f64::max);
        SingleTrackSolution::found(cost, max_delay, tree.edges())
    }
}

/// The partially-built out-tree, maintained incrementally as subscribers are
/// attached. `parent`/`children` give O(1) ancestor-walk and subtree BFS; a
/// plain `petgraph` tree would need per-query traversal for both.
struct GrowingTree {
    publisher: String,
    parent: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
    lat: HashMap<String, f64>,
}

impl GrowingTree {
    fn new(publisher: &str) -> Self {
        let mut children = HashMap::new();
        children.insert(publisher.to_string(), Vec::new());
        let mut lat = HashMap::new();
        lat.insert(publisher.to_string(), 0.0);
        Self {
            publisher: publisher.to_string(),
            parent: HashMap::new(),
            children,
            lat,
        }
    }

    fn insert(&mut self, node: &str, parent: &str, latency_from_parent: f64) {
        self.parent.insert(node.to_string(), parent.to_string());
        self.children.entry(parent.to_string()).or_default().push(node.to_string());
        self.children.entry(node.to_string()).or_default();
        self.lat.insert(node.to_string(), self.lat[parent] + latency_from_parent);
    }

    /// `node` and every ancestor up to (and including) the publisher.
    fn ancestors_inclusive(&self, node: &str) -> HashSet<String> {
        let mut path = HashSet::new();
        let mut current = node.to_string();
        loop {
            path.insert(current.clone());
            if current == self.publisher {
                break;
            }
            current = self.parent[&current].clone();
        }
        path
    }

    /// `node` and every descendant, via BFS over the tree's child edges.
    fn subtree_inclusive(&self, node: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(node.to_string());
        while let Some(current) = queue.pop_front() {
            result.push(current.clone());
            if let Some(children) = self.children.get(&current) {
                queue.extend(children.iter().cloned());
            }
        }
        result
    }

    fn reparent(&mut self, node: &str, new_parent: &str) {
        if let Some(old_parent) = self.parent.get(node).cloned() {
            if let Some(siblings) = self.children.get_mut(&old_parent) {
                siblings.retain(|child| child != node);
            }
        }
        self.parent.insert(node.to_string(), new_parent.to_string());
        self.children.entry(new_parent.to_string()).or_default().push(node.to_string());
    }

    fn nodes_sorted(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.lat.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    fn edges(&self) -> Vec<(String, String)> {
        let mut edges: Vec<(String, String)> = self
            .parent
            .iter()
            .map(|(child, parent)| (parent.clone(), child.clone()))
            .collect();
        edges.sort();
        edges
    }
}

/// Among edges `(u, subscriber)` with `u` already in the tree and the delay
/// budget respected, pick the one minimizing `(cost, resulting latency)`.
fn attach(
    graph: &TopologyGraph,
    delay_budget: f64,
    tree: &mut GrowingTree,
    subscriber: &str,
) -> Option<String> {
    let mut best: Option<(String, f64, f64)> = None; // (node, cost, latency)

    for candidate in tree.nodes_sorted() {
        let Some(edge) = graph.get_edge(&candidate, subscriber) else {
            continue;
        };
        let resulting_latency = tree.lat[&candidate] + edge.latency;
        if resulting_latency > delay_budget {
            continue;
        }
        let is_better = match &best {
            None => true,
            Some((_, best_cost, best_latency)) => {
                (edge.cost, resulting_latency) < (*best_cost, *best_latency)
            }
        };
        if is_better {
            best = Some((candidate, edge.cost, resulting_latency));
        }
    }

    let (connection_node, _, _) = best?;
    let edge = graph.get_edge(&connection_node, subscriber).unwrap();
    tree.insert(subscriber, &connection_node, edge.latency);
    Some(connection_node)
}

/// Tries to improve the tree by redirecting an existing node's traffic
/// through the just-attached `subscriber`. Cycle avoidance uses the full
/// ancestor set of `subscriber`, not just the direct publisher→subscriber
/// path, so a replacement can never close a loop through another branch.
fn augment(
    graph: &TopologyGraph,
    delay_budget: f64,
    tree: &mut GrowingTree,
    cost: &mut f64,
    subscriber: &str,
) {
    let loop_causing = tree.ancestors_inclusive(subscriber);

    struct Replacement {
        node: String,
        delay_balance: f64,
        cost_balance: f64,
    }
    let mut best: Option<Replacement> = None;

    for candidate in tree.nodes_sorted() {
        if loop_causing.contains(&candidate) {
            continue;
        }
        let old_parent = tree.parent[&candidate].clone();
        let Some(replacement_edge) = graph.get_edge(subscriber, &candidate) else {
            continue;
        };
        let old_edge = graph
            .get_edge(&old_parent, &candidate)
            .expect("tree edges always exist in the graph");

        let new_e2e_delay = tree.lat[subscriber] + replacement_edge.latency;
        let old_e2e_delay = tree.lat[&old_parent] + old_edge.latency;
        let delay_balance = new_e2e_delay - old_e2e_delay;
        let cost_balance = replacement_edge.cost - old_edge.cost;

        let subtree = tree.subtree_inclusive(&candidate);
        let admissible = subtree
            .iter()
            .all(|node| tree.lat[node] + delay_balance <= delay_budget);

        if admissible {
            let is_better = match &best {
                None => true,
                Some(current) => cost_balance < current.cost_balance,
            };
            if is_better {
                best = Some(Replacement {
                    node: candidate,
                    delay_balance,
                    cost_balance,
                });
            }
        }
    }

    let Some(replacement) = best else { return };
    let should_apply =
        replacement.cost_balance < 0.0 || (replacement.cost_balance == 0.0 && replacement.delay_balance < 0.0);
    if !should_apply {
        return;
    }

    let subtree = tree.subtree_inclusive(&replacement.node);
    tree.reparent(&replacement.node, subscriber);
    *cost += replacement.cost_balance;
    for node in subtree {
        *tree.lat.get_mut(&node).unwrap() += replacement.delay_balance;
    }
}
