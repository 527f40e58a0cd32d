//! Turning normalized requests into a [`PreferenceGraph`].

use std::collections::BTreeMap;
use std::sync::Arc;

use itertools::Itertools;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, trace};

use crate::compat::CompatibilityTable;
use crate::graph::{Node, PreferenceGraph};
use crate::request::{desired_targets, Reason, Request, Student, Target};
use crate::slot::{ParseSlotError, SlotPair};

/// Reasons a builder may become invalid while building.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuilderInvalidReason {
    /// The request reason is neither a preference nor a conflict, so its desires cannot be matched against anything.
    #[error("request from {id:?} has unrecognized reason {reason:?}")]
    UnknownReason {
        /// Student id.
        id: String,
        /// Reason as written.
        reason: String,
    },
    /// A preference request names a section which is not a `"<time> with <instructor>"` descriptor.
    #[error("request from {id:?} names a malformed section: {source}")]
    MalformedSlot {
        /// Student id.
        id: String,
        /// The descriptor that failed to parse.
        #[source]
        source: ParseSlotError,
    },
    /// Two active requests share a student identifier.
    #[error("student {id:?} has more than one active request")]
    DuplicateStudent {
        /// Student id.
        id: String,
    },
}

/// Construction failed; every reason found across the whole batch is listed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("cannot build preference graph: {}", .0.iter().join("; "))]
pub struct BuildError(pub Vec<BuilderInvalidReason>);

/// Collects requests and turns them into a [`PreferenceGraph`].
///
/// Builders mutate themselves while building but can be [`Clone`]d to save their state at some point.
/// Problems are recorded rather than returned immediately so that one [`build`](Self::build) reports all of them;
/// any problem at all makes the whole batch fail.
#[derive(Clone, Debug, Default)]
pub struct GraphBuilder {
    compat: CompatibilityTable,
    // keyed by id so node numbering follows id order
    students: BTreeMap<String, Student>,
    invalid_reasons: Vec<BuilderInvalidReason>,
}

impl GraphBuilder {
    /// Construct a new builder filtering preference requests through `compat`.
    pub fn with_compatibility(compat: CompatibilityTable) -> Self {
        Self {
            compat,
            ..Default::default()
        }
    }

    /// Add one request. Resolved requests are skipped.
    ///
    /// May record a [`BuilderInvalidReason`] if the reason is unrecognized, a preference names a malformed section,
    /// or the student already has an active request.
    pub fn add_request(&mut self, request: Request) -> &mut Self {
        let id = request.id.trim().to_owned();
        if request.resolved {
            debug!(%id, "skipping resolved request");
            return self;
        }

        let reason = match request.reason.trim().parse::<Reason>() {
            Ok(reason) => reason,
            Err(_) => {
                self.invalid_reasons.push(BuilderInvalidReason::UnknownReason { id, reason: request.reason });
                return self;
            }
        };

        let targets = match desired_targets(&request, reason, &self.compat) {
            Ok(targets) => targets,
            Err(source) => {
                self.invalid_reasons.push(BuilderInvalidReason::MalformedSlot { id, source });
                return self;
            }
        };

        if self.students.contains_key(&id) {
            self.invalid_reasons.push(BuilderInvalidReason::DuplicateStudent { id });
            return self;
        }

        trace!(%id, %reason, targets = targets.len(), "accepted request");
        self.students.insert(id.clone(), Student {
            id,
            name: request.name.trim().to_owned(),
            current: request.current,
            reason,
            targets,
        });

        self
    }

    /// Shorthand for multiple calls to [`Self::add_request`].
    pub fn add_requests(&mut self, requests: impl IntoIterator<Item = Request>) -> &mut Self {
        for request in requests {
            self.add_request(request);
        }

        self
    }

    /// Check the validity of this builder.
    ///
    /// Returns `None` if the builder is valid, `Some(&Vec<BuilderInvalidReason>)` otherwise.
    pub fn is_valid(&self) -> Option<&Vec<BuilderInvalidReason>> {
        if self.invalid_reasons.is_empty() {
            None
        } else {
            Some(&self.invalid_reasons)
        }
    }

    /// Convert the state of this builder into a [`PreferenceGraph`] with one node per active student.
    ///
    /// A student gets an edge to every other student currently holding a pair one of their targets accepts.
    /// Students sharing the requester's own pair are never targets, since trading with them changes nothing.
    pub fn build(&self) -> Result<PreferenceGraph, BuildError> {
        if !self.invalid_reasons.is_empty() {
            return Err(BuildError(self.invalid_reasons.clone()));
        }

        let students: Arc<[Student]> = self.students.values().cloned().collect();

        let mut holders: BTreeMap<&SlotPair, Vec<Node>> = BTreeMap::new();
        for (index, student) in students.iter().enumerate() {
            holders.entry(&student.current).or_default().push(Node(index));
        }

        // roughly one edge per student is typical for real request batches
        let mut graph = DiGraphMap::with_capacity(students.len(), students.len());
        for index in 0..students.len() {
            graph.add_node(Node(index));
        }

        for (index, student) in students.iter().enumerate() {
            let from = Node(index);
            for target in &student.targets {
                let matching = match target {
                    Target::Section(pair) => holders.get_key_value(pair).into_iter().collect_vec(),
                    Target::Times { .. } => holders.iter().filter(|(pair, _)| target.matches(pair)).collect_vec(),
                };

                for (pair, nodes) in matching {
                    if **pair == student.current {
                        continue;
                    }
                    for to in nodes {
                        trace!(from = %student.id, to = %students[to.0].id, "desire edge");
                        graph.add_edge(from, *to, ());
                    }
                }
            }
        }

        debug!(
            students = students.len(),
            sections = holders.len(),
            edges = graph.edge_count(),
            "built preference graph"
        );

        Ok(PreferenceGraph { graph, students })
    }
}
