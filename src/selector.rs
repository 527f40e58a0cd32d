//! Exact selection of node-disjoint swap cycles.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantArray};
use tracing::{debug, warn};

use crate::cycles::{enumerate_until, Cycle};
use crate::graph::{Node, PreferenceGraph};
use crate::limits::{Clock, SearchLimits};

/// How much a cycle is worth to the [`select`]or.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, VariantArray, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Weighting {
    /// One point per student moved.
    Unweighted,
    /// One point per priority student moved; everyone else is worth nothing.
    PriorityWeighted,
}

impl Weighting {
    /// Score of `cycle` under this weighting.
    #[inline]
    pub fn weight(&self, cycle: &Cycle, graph: &PreferenceGraph) -> usize {
        match self {
            Self::Unweighted => cycle.len(),
            Self::PriorityWeighted => cycle.priority_count(graph),
        }
    }

    /// An upper bound on what any selection within `graph` can score.
    #[inline]
    fn ceiling(&self, graph: &PreferenceGraph) -> usize {
        match self {
            Self::Unweighted => graph.node_count(),
            Self::PriorityWeighted => graph.priority_count(),
        }
    }
}

/// Node-disjoint cycles chosen together, with their combined score.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// Cycles in the order they were chosen.
    pub cycles: Vec<Cycle>,
    /// Total [`Weighting::weight`] of `cycles`.
    pub score: usize,
    /// The deadline ran out, so `score` may fall short of the maximum.
    pub truncated: bool,
}

impl Selection {
    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Every node moved by this selection.
    pub fn students(&self) -> impl Iterator<Item = Node> + '_ {
        self.cycles.iter().flat_map(|c| c.nodes().iter().copied())
    }

    /// Number of students moved.
    pub fn satisfied_count(&self) -> usize {
        self.cycles.iter().map(Cycle::len).sum()
    }

    /// Number of priority students moved.
    pub fn priority_satisfied(&self, graph: &PreferenceGraph) -> usize {
        self.cycles.iter().map(|c| c.priority_count(graph)).sum()
    }

    /// No student appears in two cycles.
    pub fn is_disjoint(&self) -> bool {
        self.students().all_unique()
    }
}

/// Choose node-disjoint cycles of `graph` maximizing their total [`Weighting::weight`].
///
/// Tries every enumerated cycle in turn, removes its nodes, and recurses on what remains, keeping the best total.
/// The search is exact with respect to the cycles the enumerator yields; see [`crate::cycles::enumerate`] for how that list is capped.
///
/// Ties go to the first maximum found: an alternative replaces the incumbent only if it scores strictly higher.
/// Since cycles are tried longest first and then by node sequence, this favors long cycles and low student ids.
pub fn select(graph: &PreferenceGraph, weighting: Weighting, limits: &SearchLimits) -> Selection {
    let mut search = Search {
        weighting,
        limits,
        clock: limits.clock(),
        memo: HashMap::new(),
        truncated: false,
    };
    let (cycles, score) = search.best(graph);

    if search.truncated {
        warn!(%weighting, score, "selection deadline exceeded; result may not be optimal");
    }
    debug!(%weighting, cycles = cycles.len(), score, "selected cycles");

    Selection {
        cycles,
        score,
        truncated: search.truncated,
    }
}

struct Search<'a> {
    weighting: Weighting,
    limits: &'a SearchLimits,
    clock: Clock,
    // best answer per remaining node set; enumeration only depends on the graph, so answers are reusable
    memo: HashMap<Vec<Node>, (Vec<Cycle>, usize)>,
    truncated: bool,
}

impl Search<'_> {
    fn best(&mut self, graph: &PreferenceGraph) -> (Vec<Cycle>, usize) {
        let key = graph.nodes();
        if let Some(known) = self.memo.get(&key) {
            return known.clone();
        }

        let cycles = enumerate_until(graph, self.limits, &self.clock);
        let mut best: (Vec<Cycle>, usize) = (Vec::new(), 0);
        if self.clock.expired() {
            self.truncated = true;
            return best;
        }

        for cycle in cycles {
            if self.clock.expired() {
                self.truncated = true;
                break;
            }

            let weight = self.weighting.weight(&cycle, graph);
            let reduced = graph.without(cycle.nodes().iter().copied());
            // cannot beat the incumbent strictly, so cannot replace it
            if weight + self.weighting.ceiling(&reduced) <= best.1 {
                continue;
            }

            let (rest, rest_score) = self.best(&reduced);
            if weight + rest_score > best.1 {
                let mut chosen = Vec::with_capacity(rest.len() + 1);
                chosen.push(cycle);
                chosen.extend(rest);
                best = (chosen, weight + rest_score);
            }
        }

        if !self.truncated {
            self.memo.insert(key, best.clone());
        }
        best
    }
}
