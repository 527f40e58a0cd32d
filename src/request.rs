use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::compat::CompatibilityTable;
use crate::slot::{Axis, ParseSlotError, Slot, SlotPair};

/// A normalized swap request, as handed over by whatever ingests the raw form submissions.
///
/// Desired lists hold raw descriptors whose meaning depends on `reason`:
/// full `"<time> with <instructor>"` descriptors for a preference, bare times for a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Stable student identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Raw request reason; see [`Reason`] for the accepted spellings.
    pub reason: String,
    /// The sections the student currently attends.
    pub current: SlotPair,
    /// Recitations the student would accept.
    #[serde(default)]
    pub desired_recitations: Vec<String>,
    /// Tutorials the student would accept.
    #[serde(default)]
    pub desired_tutorials: Vec<String>,
    /// Requests already handled by staff never reach the graph.
    #[serde(default)]
    pub resolved: bool,
}

/// Why a student wants to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Reason {
    /// Instructor grouping; desired sections are constrained by the [`CompatibilityTable`].
    #[strum(to_string = "preference", serialize = "team preference")]
    Preference,
    /// An unavoidable external conflict; only times matter. These students have priority.
    #[strum(to_string = "conflict", serialize = "schedule conflict")]
    Conflict,
}

/// A place a student would accept moving to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// An exact section pair, instructors included.
    Section(SlotPair),
    /// Any section pair meeting at these times, whoever teaches it.
    Times {
        /// Recitation meeting time.
        recitation: String,
        /// Tutorial meeting time.
        tutorial: String,
    },
}

impl Target {
    /// Whether a student currently holding `pair` occupies a spot this target accepts.
    pub fn matches(&self, pair: &SlotPair) -> bool {
        match self {
            Self::Section(section) => section == pair,
            Self::Times { recitation, tutorial } => pair.times() == (recitation.as_str(), tutorial.as_str()),
        }
    }

    /// Whether this target lands in `slot` along `axis` alone.
    pub fn matches_on(&self, axis: Axis, slot: &Slot) -> bool {
        match self {
            Self::Section(section) => section.get(axis) == slot,
            Self::Times { recitation, tutorial } => {
                let time = match axis {
                    Axis::Recitation => recitation,
                    Axis::Tutorial => tutorial,
                };
                *time == slot.time
            }
        }
    }
}

/// A request after its reason and desired targets have been resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Student {
    /// Stable student identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sections currently held.
    pub current: SlotPair,
    /// Parsed request reason.
    pub reason: Reason,
    /// Everywhere the student would accept moving to.
    pub targets: Vec<Target>,
}

impl Student {
    /// Priority students are those with a conflict.
    #[inline]
    pub fn priority(&self) -> bool {
        self.reason == Reason::Conflict
    }
}

/// Trimmed entries of a desired list, skipping blank ones.
pub(crate) fn non_blank(entries: &[String]) -> impl Iterator<Item = &str> {
    entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty())
}

/// Expand the desired lists of `request` into concrete [`Target`]s.
///
/// Preference requests take the cross product of desired sections, keeping only instructor pairs present in `compat`.
/// Conflict requests take the unfiltered cross product of available times, so a blank list on either axis yields no targets.
pub(crate) fn desired_targets(
    request: &Request,
    reason: Reason,
    compat: &CompatibilityTable,
) -> Result<Vec<Target>, ParseSlotError> {
    match reason {
        Reason::Preference => {
            let recitations = non_blank(&request.desired_recitations).map(str::parse::<Slot>).collect::<Result<Vec<_>, _>>()?;
            let tutorials = non_blank(&request.desired_tutorials).map(str::parse::<Slot>).collect::<Result<Vec<_>, _>>()?;

            Ok(recitations.into_iter()
                .cartesian_product(tutorials)
                .filter(|(r, t)| compat.contains(&r.instructor, &t.instructor))
                .map(|(r, t)| Target::Section(SlotPair::new(r, t)))
                .unique()
                .collect_vec())
        }
        Reason::Conflict => {
            let recitations = non_blank(&request.desired_recitations).map(str::to_owned).collect_vec();
            let tutorials = non_blank(&request.desired_tutorials).map(str::to_owned).collect_vec();

            Ok(recitations.into_iter()
                .cartesian_product(tutorials)
                .map(|(recitation, tutorial)| Target::Times { recitation, tutorial })
                .unique()
                .collect_vec())
        }
    }
}
