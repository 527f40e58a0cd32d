//! Caps and deadlines for cycle enumeration, selection, and path finding.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Most cycles collected from one graph before enumeration stops.
pub const DEFAULT_MAX_CYCLES: usize = 1000;

/// The order in which the cycle enumerator walks the graph.
///
/// Only matters once the cycle cap is hit: below it, every order finds the same cycles.
/// Above it, different orders keep different subsets, which is how alternative selections are obtained.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum EnumerationOrder {
    /// Ascending student id everywhere. Repeated runs give identical results.
    #[default]
    Canonical,
    /// Start nodes and successors permuted by a generator seeded with `seed`.
    Shuffled {
        /// Generator seed; rerun with another to look for alternatives.
        seed: u64,
    },
}

/// Bounds on the exponential parts of the search.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Most cycles collected from one graph before enumeration stops.
    pub max_cycles: usize,
    /// Most augmenting paths collected per `(from, to)` pair; unbounded if `None`.
    pub max_paths: Option<usize>,
    /// Wall-clock budget for one selector or path-finder call.
    #[serde(with = "optional_millis")]
    pub deadline: Option<Duration>,
    /// Walk order for the cycle enumerator.
    pub order: EnumerationOrder,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            max_paths: None,
            deadline: None,
            order: EnumerationOrder::Canonical,
        }
    }
}

impl SearchLimits {
    /// Use `order` for cycle enumeration.
    pub fn with_order(mut self, order: EnumerationOrder) -> Self {
        self.order = order;
        self
    }

    /// Stop enumerating after `max_cycles` cycles.
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Give each selector or path-finder call `deadline` of wall-clock time.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub(crate) fn clock(&self) -> Clock {
        Clock {
            expires: self.deadline.map(|budget| Instant::now() + budget),
        }
    }
}

/// A started deadline.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Clock {
    expires: Option<Instant>,
}

impl Clock {
    #[inline]
    pub(crate) fn expired(&self) -> bool {
        self.expires.is_some_and(|at| Instant::now() >= at)
    }
}

impl EnumerationOrder {
    /// The generator permuting the walk, if any.
    pub(crate) fn rng(&self) -> Option<StdRng> {
        match self {
            Self::Canonical => None,
            Self::Shuffled { seed } => Some(StdRng::seed_from_u64(*seed)),
        }
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
