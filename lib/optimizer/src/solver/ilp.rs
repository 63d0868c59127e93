use std::collections::HashMap;

use good_lp::{constraint, microlp, Expression, ProblemVariables, Solution, SolverModel, Variable};
use topology_graph::TopologyGraph;

use crate::{deadline::Deadline, solution::SingleTrackSolution, track::Track};

use super::SingleTrackOptimizer;

/// Some large number bounding `x` whenever its matching `z` is selected;
/// must dominate any realistic per-link transmission rate.
const BIG_M: f64 = 1e4;

/// Exact cost-minimal tree via mixed-integer programming: a continuous
/// flow per stream (`x`), its link-selection indicator (`z`), and the
/// link-usage aggregate (`y`) that the objective actually prices.
#[derive(Debug, Default)]
pub struct IntegerLinearProgramming;

impl SingleTrackOptimizer for IntegerLinearProgramming {
    fn solve(&self, graph: &TopologyGraph, track: &Track, deadline: Deadline) -> SingleTrackSolution {
        if deadline.expired() {
            return SingleTrackSolution::not_found();
        }

        let edges: Vec<(String, String, f64, f64)> = graph
            .edges()
            .map(|(u, v, edge)| (u.to_string(), v.to_string(), edge.latency, edge.cost))
            .collect();
        let streams = track.streams();
        if streams.is_empty() {
            return SingleTrackSolution::found(0.0, 0.0, Vec::new());
        }

        let mut vars = ProblemVariables::new();

        let mut x: HashMap<(String, usize), Variable> = HashMap::new();
        let mut z: HashMap<(String, usize), Variable> = HashMap::new();
        let mut y: Vec<Variable> = Vec::with_capacity(edges.len());

        for stream in &streams {
            for (index, _) in edges.iter().enumerate() {
                x.insert(
                    (stream.subscriber.clone(), index),
                    vars.add(good_lp::variable().min(0.0)),
                );
                z.insert(
                    (stream.subscriber.clone(), index),
                    vars.add(good_lp::variable().binary()),
                );
            }
        }
        for _ in &edges {
            y.push(vars.add(good_lp::variable().min(0.0)));
        }

        let objective: Expression = edges
            .iter()
            .zip(y.iter())
            .map(|((_, _, _, cost), &y_e)| *cost * y_e)
            .sum();

        let mut model = vars.minimise(objective.clone()).using(microlp);

        for (index, _) in edges.iter().enumerate() {
            for stream in &streams {
                let x_e = x[&(stream.subscriber.clone(), index)];
                model = model.with(constraint!(y[index] >= x_e));
            }
        }

        for stream in &streams {
            for node in graph.nodes() {
                let in_going: Expression = edges
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, v, _, _))| v == &node.id)
                    .map(|(index, _)| x[&(stream.subscriber.clone(), index)])
                    .sum();
                let out_going: Expression = edges
                    .iter()
                    .enumerate()
                    .filter(|(_, (u, _, _, _))| u == &node.id)
                    .map(|(index, _)| x[&(stream.subscriber.clone(), index)])
                    .sum();
                let reliability = stream.reliability(&node.id) as f64;
                model = model.with(constraint!(in_going - out_going == reliability));
            }
        }

        for (index, _) in edges.iter().enumerate() {
            for stream in &streams {
                let x_e = x[&(stream.subscriber.clone(), index)];
                let z_e = z[&(stream.subscriber.clone(), index)];
                model = model.with(constraint!(BIG_M * z_e >= x_e));
            }
        }

        for stream in &streams {
            let path_latency: Expression = edges
                .iter()
                .enumerate()
                .map(|(index, (_, _, latency, _))| *latency * z[&(stream.subscriber.clone(), index)])
                .sum();
            model = model.with(constraint!(path_latency <= track.delay_budget()));
        }

        let Ok(solution) = model.solve() else {
            return SingleTrackSolution::not_found();
        };

        #[cfg(debug_assertions)]
        for (&(ref subscriber, index), &x_e) in &x {
            let flow = solution.value(x_e);
            if flow >= BIG_M {
                tracing::warn!(subscriber = %subscriber, edge_index = index, flow, "flow approaches BIG_M, linking constraint may be unsound");
            }
        }

        let cost = solution.eval(&objective);

        let used_links: Vec<(String, String)> = edges
            .iter()
            .zip(y.iter())
            .filter(|(_, &y_e)| solution.value(y_e) > 0.5)
            .map(|((u, v, _, _), _)| (u.clone(), v.clone()))
            .collect();

        let max_delay = streams
            .iter()
            .map(|stream| {
                edges
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| solution.value(z[&(stream.subscriber.clone(), *index)]) > 0.5)
                    .map(|(_, (_, _, latency, _))| *latency)
                    .sum::<f64>()
            })
            .fold(0.0_f64, f64::max);

        SingleTrackSolution::found(cost, max_delay, used_links)
    }
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
    fn finds_cheapest_feasible_tree() {
        let graph = triangle();
        let mut track = Track::new("A", 100.0).unwrap();
        track.add_subscriber("B").unwrap();
        track.add_subscriber("C").unwrap();

        let solution = IntegerLinearProgramming.solve(&graph, &track, Deadline::none());
        assert!(solution.success);
        assert_eq!(solution.cost, 11.0);
        assert!(solution.max_delay <= 100.0);
    }

    #[test]
    fn infeasible_budget_fails() {
        let graph = triangle();
        let mut track = Track::new("A", 5.0).unwrap();
        track.add_subscriber("B").unwrap();

        let solution = IntegerLinearProgramming.solve(&graph, &track, Deadline::none());
        assert!(!solution.success);
    }

    #[test]
    fn empty_subscriber_set_is_free() {
        let graph = triangle();
        let track = Track::new("A", 100.0).unwrap();
        let solution = IntegerLinearProgramming.solve(&graph, &track, Deadline::none());
        assert!(solution.success);
        assert_eq!(solution.cost, 0.0);
    }
}
