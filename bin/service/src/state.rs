use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;

use topology_graph::TopologyGraph;
use topology_optimizer::{Deadline, SingleTrackOptimizerKind, SingleTrackSolution, Track, TrackError};

use crate::error::{InfeasibleReason, ServiceError};

/// A track plus the last solution computed for its current subscriber
/// set, guarded together so the two never drift apart.
pub struct TrackEntry {
    pub track: Track,
    pub cached: Option<SingleTrackSolution>,
}

/// Process-wide shared state behind `Arc<ServiceState>`.
pub struct ServiceState {
    graph: TopologyGraph,
    registry: DashMap<String, Arc<Mutex<TrackEntry>>>,
    default_optimizer: SingleTrackOptimizerKind,
    solve_deadline: Duration,
}

pub struct TrackView {
    pub publisher: String,
    pub delay_budget: f64,
}

impl ServiceState {
    pub fn new(graph: TopologyGraph, default_optimizer: SingleTrackOptimizerKind, solve_deadline: Duration) -> Self {
        Self {
            graph,
            registry: DashMap::new(),
            default_optimizer,
            solve_deadline,
        }
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn default_optimizer(&self) -> SingleTrackOptimizerKind {
        self.default_optimizer
    }

    pub fn solve_deadline(&self) -> Duration {
        self.solve_deadline
    }

    pub fn namespaces(&self) -> Vec<(String, TrackView)> {
        self.registry
            .iter()
            .map(|entry| {
                let track = entry.value().lock().unwrap();
                (
                    entry.key().clone(),
                    TrackView {
                        publisher: track.track.publisher().to_string(),
                        delay_budget: track.track.delay_budget(),
                    },
                )
            })
            .collect()
    }

    /// Replaces the namespace's entry outright, dropping any prior cache.
    pub fn create_track(&self, namespace: &str, publisher: &str, delay_budget: f64) -> Result<(), ServiceError> {
        let track = Track::new(publisher, delay_budget)?;
        self.registry.insert(
            namespace.to_string(),
            Arc::new(Mutex::new(TrackEntry { track, cached: None })),
        );
        Ok(())
    }

    pub fn get_track(&self, namespace: &str) -> Result<TrackView, ServiceError> {
        let entry = self
            .registry
            .get(namespace)
            .ok_or(ServiceError::NotFound("track"))?;
        let guard = entry.value().lock().unwrap();
        Ok(TrackView {
            publisher: guard.track.publisher().to_string(),
            delay_budget: guard.track.delay_budget(),
        })
    }

    pub fn get_topology(&self, namespace: &str) -> Result<SingleTrackSolution, ServiceError> {
        let entry = self
            .registry
            .get(namespace)
            .ok_or(ServiceError::NotFound("track"))?;
        let guard = entry.value().lock().unwrap();
        guard.cached.clone().ok_or(ServiceError::NotFound("topology"))
    }

    /// Optimizes on a trial clone of the track and only commits it (with
    /// the new solution) back into the entry once the solve succeeds and
    /// the caller has not since abandoned the request (`cancelled`).
    pub fn subscribe(
        &self,
        namespace: &str,
        subscriber: &str,
        optimizer: SingleTrackOptimizerKind,
        reduce_network: bool,
        cancelled: &AtomicBool,
    ) -> Result<String, ServiceError> {
        let entry = self
            .registry
            .get(namespace)
            .ok_or(ServiceError::NotFound("track"))?
            .value()
            .clone();
        let mut guard = entry.lock().unwrap();

        if !self.graph.contains_node(guard.track.publisher()) {
            return Err(ServiceError::BadInput(format!(
                "unknown publisher: {}",
                guard.track.publisher()
            )));
        }

        if guard.track.is_subscribed(subscriber) {
            let next_hop = guard
                .cached
                .as_ref()
                .and_then(|solution| solution.next_hop(subscriber))
                .map(str::to_string)
                .ok_or(ServiceError::NoNextHop)?;
            return Err(ServiceError::AlreadyExists { next_hop });
        }

        let mut trial_track = guard.track.clone();
        trial_track.add_subscriber(subscriber)?;

        let solve_graph = if reduce_network {
            let mut reduced = self.graph.copy();
            let mut keep: std::collections::HashSet<String> = trial_track.subscribers().clone();
            keep.insert(trial_track.publisher().to_string());
            reduced.remove_nodes_not_in(&keep);
            reduced
        } else {
            self.graph.copy()
        };

        let deadline = Deadline::after(self.solve_deadline);
        let solution = optimizer.build().solve(&solve_graph, &trial_track, deadline);

        if !solution.success {
            return Err(ServiceError::Infeasible {
                reason: if deadline.expired() {
                    InfeasibleReason::Timeout
                } else {
                    InfeasibleReason::Optimizer
                },
            });
        }

        // The outer request may have already given up on us (deadline hit
        // before this solve returned). Shared state must stay untouched in
        // that case, so the commit below is conditional on still being wanted.
        if cancelled.load(Ordering::SeqCst) {
            return Err(ServiceError::Infeasible { reason: InfeasibleReason::Timeout });
        }

        let next_hop = solution
            .next_hop(subscriber)
            .map(str::to_string)
            .ok_or(ServiceError::NoNextHop)?;

        guard.track = trial_track;
        guard.cached = Some(solution);

        Ok(next_hop)
    }

    /// Removes the subscriber and invalidates the cache; does not
    /// eagerly recompute a solution for the reduced subscriber set.
    pub fn unsubscribe(&self, namespace: &str, subscriber: &str) -> Result<(), ServiceError> {
        let entry = self
            .registry
            .get(namespace)
            .ok_or(ServiceError::NotFound("track"))?
            .value()
            .clone();
        let mut guard = entry.lock().unwrap();
        guard.track.remove_subscriber(subscriber).map_err(|error| match error {
            TrackError::NotSubscribed(_) => ServiceError::NotFound("subscriber"),
            other => other.into(),
        })?;
        guard.cached = None;
        Ok(())
    }
}
