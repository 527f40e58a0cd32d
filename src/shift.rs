//! Augmenting paths that shift one student's worth of occupancy between sections when no swap cycle helps.

use std::cmp::Reverse;
use std::fmt::{Display, Formatter};

use itertools::Itertools;
use petgraph::algo::all_simple_paths;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};
use strum::Display as StrumDisplay;
use tracing::{debug, warn};

use crate::graph::{Node, PreferenceGraph};
use crate::limits::SearchLimits;
use crate::slot::{Axis, Slot};

/// Move one student's worth of occupancy out of a `from` section into a `to` section along `axis`.
///
/// Every `(from, to)` combination is tried separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftQuery {
    /// Overfull sections to take a student out of.
    pub from: Vec<Slot>,
    /// Underfull sections to put a student into.
    pub to: Vec<Slot>,
    /// Which half of the section pair is being balanced.
    pub axis: Axis,
}

#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
enum ShiftNode {
    Source,
    Student(Node),
    Sink,
}

/// A chain of moves: the first student leaves the `from` section for the second's sections,
/// the second takes the third's, and so on until the last student lands in the `to` section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShiftPath {
    /// Student display names, in move order.
    pub names: Vec<String>,
    /// Student ids, parallel to `names`.
    pub ids: Vec<String>,
    /// Priority students along the chain.
    pub priority: usize,
}

impl ShiftPath {
    fn new(graph: &PreferenceGraph, nodes: impl IntoIterator<Item = Node>) -> Self {
        let (names, ids, priority) = nodes.into_iter()
            .map(|n| graph.student(n))
            .fold((Vec::new(), Vec::new(), 0), |(mut names, mut ids, priority), student| {
                names.push(student.name.clone());
                ids.push(student.id.clone());
                (names, ids, priority + usize::from(student.priority()))
            });
        Self { names, ids, priority }
    }

    /// Number of students moved.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the chain moves nobody.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Why a `(from, to)` combination produced nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, StrumDisplay)]
#[serde(rename_all = "kebab-case")]
pub enum NoPathReason {
    /// Nobody with a request sits in the `from` section.
    #[strum(to_string = "no requesting student sits in the source section")]
    SourceIsolated,
    /// Nobody with a request would accept the `to` section.
    #[strum(to_string = "no requesting student wants the target section")]
    SinkIsolated,
    /// Both ends have students, but no chain of requests joins them.
    #[strum(to_string = "no chain of requests connects the two sections")]
    Unreachable,
}

/// Result of one `(from, to)` combination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "result")]
pub enum ShiftOutcome {
    /// Nothing to propose for this combination.
    NoPath {
        /// What was missing.
        reason: NoPathReason,
    },
    /// Candidate chains, ranked two ways.
    ///
    /// Both lists are empty only when the path cap or deadline stopped collection before the first chain.
    Found {
        /// Longest chains first; a longer chain satisfies more requests along the way.
        by_length: Vec<ShiftPath>,
        /// Chains with the most priority students first.
        by_priority: Vec<ShiftPath>,
        /// Path collection stopped early at the path cap or deadline.
        truncated: bool,
    },
}

/// One `(from, to)` combination of a [`ShiftQuery`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShiftAttempt {
    /// Section a student leaves.
    pub from: Slot,
    /// Section a student enters.
    pub to: Slot,
    /// What the search found.
    pub outcome: ShiftOutcome,
}

/// Every `(from, to)` combination of a [`ShiftQuery`] and what came of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShiftReport {
    /// Axis of the query.
    pub axis: Axis,
    /// One entry per combination, `from`-major.
    pub attempts: Vec<ShiftAttempt>,
}

impl ShiftReport {
    /// Whether at least one combination produced a chain. Only when none did has the shift failed overall.
    pub fn any_found(&self) -> bool {
        self.attempts.iter().any(|a| matches!(a.outcome, ShiftOutcome::Found { .. }))
    }
}

impl Display for ShiftReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for attempt in &self.attempts {
            match &attempt.outcome {
                ShiftOutcome::NoPath { reason } => {
                    writeln!(f, "No free paths from {} to {}: {}.", attempt.from, attempt.to, reason)?;
                }
                ShiftOutcome::Found { by_length, by_priority, truncated } => {
                    writeln!(
                        f,
                        "Removing from {} and adding to {} ({}){}:",
                        attempt.from,
                        attempt.to,
                        self.axis,
                        if *truncated { " [search cut short]" } else { "" }
                    )?;
                    writeln!(f, "Potential paths (ranked by number of appeals met):")?;
                    for (i, path) in by_length.iter().enumerate() {
                        writeln!(f, "\t{}. {}", i + 1, path.names.join(" -> "))?;
                    }
                    writeln!(f, "Potential paths (ranked by number of schedule conflicts fixed):")?;
                    for (i, path) in by_priority.iter().enumerate() {
                        writeln!(f, "\t{}. {}", i + 1, path.names.join(" -> "))?;
                    }
                }
            }
        }

        if !self.any_found() {
            writeln!(f, "No free paths for any combination.")?;
        }
        Ok(())
    }
}

/// Search for augmenting paths for every `(from, to)` combination in `query`.
///
/// Each combination gets its own copy of the desire edges plus a synthetic source, with an edge to every student sitting
/// in `from` on the query axis, and a synthetic sink, with an edge from every student whose targets land in `to` on that axis
/// (exact section for preferences, time only for conflicts). `graph` itself is never touched.
pub fn find_shift_paths(graph: &PreferenceGraph, query: &ShiftQuery, limits: &SearchLimits) -> ShiftReport {
    let clock = limits.clock();

    let attempts = query.from.iter()
        .cartesian_product(query.to.iter())
        .map(|(from, to)| {
            let outcome = shift_one(graph, from, to, query.axis, limits, || clock.expired());
            if let ShiftOutcome::NoPath { reason } = outcome {
                debug!(%from, %to, %reason, "no shift path");
            }
            ShiftAttempt {
                from: from.clone(),
                to: to.clone(),
                outcome,
            }
        })
        .collect_vec();

    let report = ShiftReport { axis: query.axis, attempts };
    if !report.any_found() {
        warn!(axis = %query.axis, combinations = report.attempts.len(), "no shift path for any combination");
    }
    report
}

fn shift_one(
    graph: &PreferenceGraph,
    from: &Slot,
    to: &Slot,
    axis: Axis,
    limits: &SearchLimits,
    expired: impl Fn() -> bool,
) -> ShiftOutcome {
    let mut flow: DiGraphMap<ShiftNode, ()> = DiGraphMap::with_capacity(graph.node_count() + 2, graph.edge_count());

    for node in graph.nodes() {
        let student = graph.student(node);
        if student.current.get(axis) == from {
            flow.add_edge(ShiftNode::Source, ShiftNode::Student(node), ());
        }
        for succ in graph.successors(node) {
            flow.add_edge(ShiftNode::Student(node), ShiftNode::Student(succ), ());
        }
        if student.targets.iter().any(|t| t.matches_on(axis, to)) {
            flow.add_edge(ShiftNode::Student(node), ShiftNode::Sink, ());
        }
    }

    if !flow.contains_node(ShiftNode::Source) {
        return ShiftOutcome::NoPath { reason: NoPathReason::SourceIsolated };
    }
    if !flow.contains_node(ShiftNode::Sink) {
        return ShiftOutcome::NoPath { reason: NoPathReason::SinkIsolated };
    }

    let cap = limits.max_paths.unwrap_or(usize::MAX);
    let mut paths = Vec::new();
    let mut truncated = false;
    for path in all_simple_paths::<Vec<ShiftNode>, _>(&flow, ShiftNode::Source, ShiftNode::Sink, 0, None) {
        if paths.len() >= cap || expired() {
            truncated = true;
            break;
        }
        let students = path.into_iter().filter_map(|n| match n {
            ShiftNode::Student(node) => Some(node),
            ShiftNode::Source | ShiftNode::Sink => None,
        });
        paths.push(ShiftPath::new(graph, students));
    }

    // a cut-short search with nothing collected says nothing about reachability
    if paths.is_empty() && !truncated {
        return ShiftOutcome::NoPath { reason: NoPathReason::Unreachable };
    }

    let by_length = paths.iter().cloned().sorted_by_key(|p| Reverse(p.len())).collect_vec();
    let by_priority = paths.into_iter().sorted_by_key(|p| Reverse(p.priority)).collect_vec();
    ShiftOutcome::Found { by_length, by_priority, truncated }
}
