use std::collections::BTreeMap;

use good_lp::{constraint, microlp, Expression, ProblemVariables, Solution, SolverModel, Variable};
use topology_graph::TopologyGraph;

use crate::{
    deadline::Deadline,
    solution::{MultiTrackSolution, SingleTrackSolution},
    solver::SingleTrackOptimizerKind,
    track::Track,
};

const BIG_M: f64 = 1e4;

/// Strategy for solving a whole registry of tracks at once.
pub enum MultiTrackOptimizerKind {
    /// Solve every track independently with the given single-track
    /// strategy, short-circuiting at the first infeasible track.
    Adapted(SingleTrackOptimizerKind),
    /// One combined mixed-integer program covering every track's streams
    /// simultaneously.
    Native,
}

impl MultiTrackOptimizerKind {
    pub fn solve(
        &self,
        graph: &TopologyGraph,
        tracks: &BTreeMap<String, Track>,
        deadline: Deadline,
    ) -> MultiTrackSolution {
        match self {
            Self::Adapted(kind) => adapted(graph, tracks, *kind, deadline),
            Self::Native => native(graph, tracks, deadline),
        }
    }
}

/// Sequential per-track solve via the configured single-track optimizer.
/// No cross-track coupling: each track sees the full, unmodified graph.
fn adapted(
    graph: &TopologyGraph,
    tracks: &BTreeMap<String, Track>,
    kind: SingleTrackOptimizerKind,
    deadline: Deadline,
) -> MultiTrackSolution {
    let optimizer = kind.build();
    let mut solutions = BTreeMap::new();
    for (track_id, track) in tracks {
        if deadline.expired() {
            return MultiTrackSolution::not_found();
        }
        let solution = optimizer.solve(graph, track, deadline);
        if !solution.success {
            return MultiTrackSolution::not_found();
        }
        solutions.insert(track_id.clone(), solution);
    }
    MultiTrackSolution::found(solutions)
}

/// One monolithic mixed-integer program over every track's streams at
/// once. Each track keeps its own flow-conservation and delay-budget
/// constraints; only the objective and the shared `y` variables tie
/// tracks together through link reuse.
fn native(graph: &TopologyGraph, tracks: &BTreeMap<String, Track>, deadline: Deadline) -> MultiTrackSolution {
    if deadline.expired() {
        return MultiTrackSolution::not_found();
    }
    if tracks.is_empty() {
        return MultiTrackSolution::found(BTreeMap::new());
    }

    let edges: Vec<(String, String, f64, f64)> = graph
        .edges()
        .map(|(u, v, edge)| (u.to_string(), v.to_string(), edge.latency, edge.cost))
        .collect();

    let mut vars = ProblemVariables::new();

    // Keyed by (track_id, subscriber, edge_index).
    let mut x: std::collections::HashMap<(String, String, usize), Variable> = std::collections::HashMap::new();
    let mut z: std::collections::HashMap<(String, String, usize), Variable> = std::collections::HashMap::new();
    // Keyed by (track_id, edge_index).
    let mut y: std::collections::HashMap<(String, usize), Variable> = std::collections::HashMap::new();

    for (track_id, track) in tracks {
        for stream in track.streams() {
            for index in 0..edges.len() {
                x.insert(
                    (track_id.clone(), stream.subscriber.clone(), index),
                    vars.add(good_lp::variable().min(0.0)),
                );
                z.insert(
                    (track_id.clone(), stream.subscriber.clone(), index),
                    vars.add(good_lp::variable().binary()),
                );
            }
        }
        for index in 0..edges.len() {
            y.insert((track_id.clone(), index), vars.add(good_lp::variable().min(0.0)));
        }
    }

    let objective: Expression = tracks
        .keys()
        .flat_map(|track_id| edges.iter().enumerate().map(move |(index, edge)| (track_id, index, edge)))
        .map(|(track_id, index, (_, _, _, cost))| *cost * y[&(track_id.clone(), index)])
        .sum();

    let mut model = vars.minimise(objective.clone()).using(microlp);

    for (track_id, track) in tracks {
        for stream in track.streams() {
            for index in 0..edges.len() {
                let x_e = x[&(track_id.clone(), stream.subscriber.clone(), index)];
                let y_e = y[&(track_id.clone(), index)];
                model = model.with(constraint!(y_e >= x_e));
            }
        }
    }

    for (track_id, track) in tracks {
        for stream in track.streams() {
            for node in graph.nodes() {
                let in_going: Expression = edges
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, v, _, _))| v == &node.id)
                    .map(|(index, _)| x[&(track_id.clone(), stream.subscriber.clone(), index)])
                    .sum();
                let out_going: Expression = edges
                    .iter()
                    .enumerate()
                    .filter(|(_, (u, _, _, _))| u == &node.id)
                    .map(|(index, _)| x[&(track_id.clone(), stream.subscriber.clone(), index)])
                    .sum();
                let reliability = stream.reliability(&node.id) as f64;
                model = model.with(constraint!(in_going - out_going == reliability));
            }
        }
    }

    for (track_id, track) in tracks {
        for stream in track.streams() {
            for index in 0..edges.len() {
                let x_e = x[&(track_id.clone(), stream.subscriber.clone(), index)];
                let z_e = z[&(track_id.clone(), stream.subscriber.clone(), index)];
                model = model.with(constraint!(BIG_M * z_e >= x_e));
            }
        }
    }

    for (track_id, track) in tracks {
        for stream in track.streams() {
            let path_latency: Expression = edges
                .iter()
                .enumerate()
                .map(|(index, (_, _, latency, _))| {
                    *latency * z[&(track_id.clone(), stream.subscriber.clone(), index)]
                })
                .sum();
            model = model.with(constraint!(path_latency <= track.delay_budget()));
        }
    }

    let Ok(solution) = model.solve() else {
        return MultiTrackSolution::not_found();
    };

    let mut solutions = BTreeMap::new();
    for track_id in tracks.keys() {
        let used_links: Vec<(String, String)> = edges
            .iter()
            .enumerate()
            .filter(|(index, _)| solution.value(y[&(track_id.clone(), *index)]) > 0.5)
            .map(|(_, (u, v, _, _))| (u.clone(), v.clone()))
            .collect();
        let cost: f64 = used_links
            .iter()
            .filter_map(|(u, v)| graph.get_edge(u, v))
            .map(|edge| edge.cost)
            .sum();

        let track = &tracks[track_id];
        let max_delay = track
            .streams()
            .iter()
            .map(|stream| {
                edges
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| {
                        solution.value(z[&(track_id.clone(), stream.subscriber.clone(), *index)]) > 0.5
                    })
                    .map(|(_, (_, _, latency, _))| *latency)
                    .sum::<f64>()
            })
            .fold(0.0_f64, f64::max);

        solutions.insert(track_id.clone(), SingleTrackSolution::found(cost, max_delay, used_links));
    }

    MultiTrackSolution::found(solutions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        for id in ["A", "B", "C"] {
            graph.add_node(id, (0.0, 0.0));
        }
        graph.add_edge("A", "B", 10.0, 10.0).unwrap();
        graph.add_edge("A", "C", 10.0, 10.0).unwrap();
        graph.add_edge("B", "C", 1.0, 1.0).unwrap();
        graph
    }

    #[test]
    fn adapted_short_circuits_on_first_failure() {
        let graph = triangle();
        let mut ok_track = Track::new("A", 100.0).unwrap();
        ok_track.add_subscriber("B").unwrap();
        let mut infeasible_track = Track::new("A", 1.0).unwrap();
        infeasible_track.add_subscriber("C").unwrap();

        let mut tracks = BTreeMap::new();
        tracks.insert("ok".to_string(), ok_track);
        tracks.insert("bad".to_string(), infeasible_track);

        let kind = MultiTrackOptimizerKind::Adapted(SingleTrackOptimizerKind::DirectLinkTree);
        let solution = kind.solve(&graph, &tracks, Deadline::none());
        assert!(!solution.success());
    }

    #[test]
    fn adapted_succeeds_when_every_track_fits() {
        let graph = triangle();
        let mut track_a = Track::new("A", 100.0).unwrap();
        track_a.add_subscriber("B").unwrap();
        let mut track_b = Track::new("B", 100.0).unwrap();
        track_b.add_subscriber("C").unwrap();

        let mut tracks = BTreeMap::new();
        tracks.insert("t1".to_string(), track_a);
        tracks.insert("t2".to_string(), track_b);

        let kind = MultiTrackOptimizerKind::Adapted(SingleTrackOptimizerKind::DirectLinkTree);
        let solution = kind.solve(&graph, &tracks, Deadline::none());
        assert!(solution.success());
        assert_eq!(solution.cost(), 20.0);
    }

    #[test]
    fn native_matches_adapted_on_independent_tracks() {
        let graph = triangle();
        let mut track_a = Track::new("A", 100.0).unwrap();
        track_a.add_subscriber("B").unwrap();
        track_a.add_subscriber("C").unwrap();

        let mut tracks = BTreeMap::new();
        tracks.insert("t1".to_string(), track_a);

        let solution = MultiTrackOptimizerKind::Native.solve(&graph, &tracks, Deadline::none());
        assert!(solution.success());
        assert_eq!(solution.cost(), 11.0);
    }
}
