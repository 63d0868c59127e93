use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackError {
    #[error("delay budget must not be negative")]
    NegativeBudget,
    #[error("publisher cannot subscribe to its own track")]
    PublisherCannotSubscribe,
    #[error("subscriber not found: {0}")]
    NotSubscribed(String),
}

/// A unit-demand flow from a track's publisher to one of its subscribers.
///
/// `reliability(node)` is the flow-conservation target the ILP encoder
/// consumes: `-1` at the publisher, `+1` at the subscriber, `0` everywhere
/// else. Rather than materializing a `defaultdict`-style vector over every
/// node in the graph, only the two endpoints are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub publisher: String,
    pub subscriber: String,
}

impl Stream {
    pub fn reliability(&self, node: &str) -> i8 {
        if node == self.publisher {
            -1
        } else if node == self.subscriber {
            1
        } else {
            0
        }
    }
}

/// A publisher's broadcast group: a fixed publisher, a delay budget, and a
/// monotonically-maintained subscriber set.
#[derive(Debug, Clone)]
pub struct Track {
    publisher: String,
    delay_budget: f64,
    subscribers: HashSet<String>,
}

impl Track {
    pub fn new(publisher: impl Into<String>, delay_budget: f64) -> Result<Self, TrackError> {
        if delay_budget < 0.0 {
            return Err(TrackError::NegativeBudget);
        }
        Ok(Self {
            publisher: publisher.into(),
            delay_budget,
            subscribers: HashSet::new(),
        })
    }

    pub fn publisher(&self) -> &str {
        &self.publisher
    }

    pub fn delay_budget(&self) -> f64 {
        self.delay_budget
    }

    pub fn subscribers(&self) -> &HashSet<String> {
        &self.subscribers
    }

    pub fn is_subscribed(&self, id: &str) -> bool {
        self.subscribers.contains(id)
    }

    /// Idempotent on an already-subscribed id.
    pub fn add_subscriber(&mut self, id: &str) -> Result<(), TrackError> {
        if id == self.publisher {
            return Err(TrackError::PublisherCannotSubscribe);
        }
        self.subscribers.insert(id.to_string());
        Ok(())
    }

    pub fn remove_subscriber(&mut self, id: &str) -> Result<(), TrackError> {
        if !self.subscribers.remove(id) {
            return Err(TrackError::NotSubscribed(id.to_string()));
        }
        Ok(())
    }

    /// Regenerated from the current subscriber set on every call; never
    /// persisted on the track itself.
    pub fn streams(&self) -> Vec<Stream> {
        self.subscribers
            .iter()
            .map(|subscriber| Stream {
                publisher: self.publisher.clone(),
                subscriber: subscriber.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_budget_but_allows_zero() {
        assert_eq!(Track::new("A", -1.0).unwrap_err(), TrackError::NegativeBudget);
        assert!(Track::new("A", 0.0).is_ok());
    }

    #[test]
    fn publisher_cannot_subscribe() {
        let mut track = Track::new("A", 100.0).unwrap();
        assert_eq!(
            track.add_subscriber("A").unwrap_err(),
            TrackError::PublisherCannotSubscribe
        );
    }

    #[test]
    fn add_subscriber_is_idempotent() {
        let mut track = Track::new("A", 100.0).unwrap();
        track.add_subscriber("B").unwrap();
        track.add_subscriber("B").unwrap();
        assert_eq!(track.subscribers().len(), 1);
    }

    #[test]
    fn remove_subscriber_fails_if_absent() {
        let mut track = Track::new("A", 100.0).unwrap();
        assert_eq!(
            track.remove_subscriber("B").unwrap_err(),
            TrackError::NotSubscribed("B".to_string())
        );
    }

    #[test]
    fn streams_reflect_current_subscribers() {
        let mut track = Track::new("A", 100.0).unwrap();
        track.add_subscriber("B").unwrap();
        track.add_subscriber("C").unwrap();
        let streams = track.streams();
        assert_eq!(streams.len(), 2);
        for stream in &streams {
            assert_eq!(stream.reliability("A"), -1);
            assert_eq!(stream.reliability(&stream.subscriber), 1);
            assert_eq!(stream.reliability("Z"), 0);
        }

        track.remove_subscriber("B").unwrap();
        assert_eq!(track.streams().len(), 1);
    }
}
