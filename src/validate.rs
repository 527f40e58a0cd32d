//! Checks on requests against the authoritative roster, run before a graph is built.
//!
//! Validation only reports; what to do with a flagged request is the caller's decision.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compat::CompatibilityTable;
use crate::request::{desired_targets, non_blank, Reason, Request};
use crate::slot::SlotPair;

/// Where every student actually is, according to course staff.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    assignments: HashMap<String, SlotPair>,
}

impl Roster {
    /// Record that student `id` sits in `pair`.
    pub fn assign(&mut self, id: impl Into<String>, pair: SlotPair) -> &mut Self {
        self.assignments.insert(id.into(), pair);
        self
    }

    /// Sections of student `id`, if on the roster.
    pub fn get(&self, id: &str) -> Option<&SlotPair> {
        self.assignments.get(id)
    }

    /// Number of students on the roster.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether nobody is on the roster.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl FromIterator<(String, SlotPair)> for Roster {
    fn from_iter<I: IntoIterator<Item = (String, SlotPair)>>(iter: I) -> Self {
        Self { assignments: iter.into_iter().collect() }
    }
}

/// Something suspicious about one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "issue")]
pub enum ValidationIssue {
    /// The student is not on the roster at all.
    NotOnRoster {
        /// Student id as written on the request.
        id: String,
    },
    /// The student claims to be somewhere other than where the roster puts them.
    CurrentMismatch {
        /// Student id as written on the request.
        id: String,
        /// Sections named on the request.
        claimed: SlotPair,
        /// Sections the roster has.
        actual: SlotPair,
    },
    /// Every section combination the student asked for pairs instructors that never teach together.
    NoCompatibleTarget {
        /// Student id as written on the request.
        id: String,
    },
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOnRoster { id } => write!(f, "{} is not on the roster", id),
            Self::CurrentMismatch { id, claimed, actual } => {
                write!(f, "{} claims to be in {} but the roster has {}", id, claimed, actual)
            }
            Self::NoCompatibleTarget { id } => write!(f, "{} asked only for incompatible section combinations", id),
        }
    }
}

/// A validation pass over normalized requests.
pub trait Validator {
    /// Inspect `requests`, returning every issue found. Resolved requests are ignored.
    fn validate(&self, requests: &[Request], roster: &Roster, compat: &CompatibilityTable) -> Vec<ValidationIssue>;
}

/// Accepts everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _: &[Request], _: &Roster, _: &CompatibilityTable) -> Vec<ValidationIssue> {
        Vec::new()
    }
}

/// Cross-checks each request's current sections against a [`Roster`] and flags preference requests left with nothing compatible.
///
/// Requests with an unrecognized reason or malformed sections are left for the graph builder to reject.
#[derive(Copy, Clone, Debug, Default)]
pub struct RosterValidator;

impl Validator for RosterValidator {
    fn validate(&self, requests: &[Request], roster: &Roster, compat: &CompatibilityTable) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        for request in requests.iter().filter(|r| !r.resolved) {
            let id = request.id.trim();
            match roster.get(id) {
                None => issues.push(ValidationIssue::NotOnRoster { id: id.to_owned() }),
                Some(actual) if *actual != request.current => issues.push(ValidationIssue::CurrentMismatch {
                    id: id.to_owned(),
                    claimed: request.current.clone(),
                    actual: actual.clone(),
                }),
                Some(_) => {}
            }

            let asked_for_something = non_blank(&request.desired_recitations).next().is_some()
                && non_blank(&request.desired_tutorials).next().is_some();
            if let Ok(Reason::Preference) = request.reason.trim().parse::<Reason>() {
                if asked_for_something && desired_targets(request, Reason::Preference, compat).is_ok_and(|t| t.is_empty()) {
                    issues.push(ValidationIssue::NoCompatibleTarget { id: id.to_owned() });
                }
            }
        }

        debug!(requests = requests.len(), issues = issues.len(), "validated requests against roster");
        issues
    }
}
