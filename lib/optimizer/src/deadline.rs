use std::time::{Duration, Instant};

/// A soft deadline checked at solver iteration boundaries, rather than an
/// OS-level timeout. Solvers consult [`Deadline::expired`] between
/// subscribers (heuristic/star/MST) or before invoking the MILP backend.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn after(duration: Duration) -> Self {
        Self(Some(Instant::now() + duration))
    }

    pub fn expired(&self) -> bool {
        matches!(self.0, Some(at) if Instant::now() >= at)
    }
}
