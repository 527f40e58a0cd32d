#![warn(missing_docs)]

//! # `slotswap`
//!
//! Finds groups of students who can trade recitation and tutorial sections among themselves without changing how full any section is.
//! Begin by feeding normalized [`Request`]s to a [`GraphBuilder`], together with the [`CompatibilityTable`] of instructors who teach together.
//! Build a [`PreferenceGraph`], then hand it to a [`scheduler`] strategy to get a [`ScheduleReport`] of swap cycles,
//! or to [`find_shift_paths`] to move occupancy from one section to another when no cycle is available.
//!
//! Nothing here edits a roster. Every result is a proposal for course staff to apply by hand.
//!
//! # Internals
//! A student sitting in some section pair is a node; an edge from student A to student B says A would accept B's sections.
//! Preference requests name exact sections, filtered through the compatibility table, and match only exactly.
//! Conflict requests name times only, so they match any section pair meeting at those times, whoever teaches it.
//!
//! A cycle in this graph is a swap everyone in it wants, and executing it leaves every section's headcount unchanged.
//! The [`selector`] picks node-disjoint cycles by exact recursive search: try each cycle, remove its students, recurse on the rest.
//! Scores count students moved, or only priority (conflict) students, and the conflict-first schedule runs the priority-weighted
//! search before filling in with everyone else.
//!
//! Cycle enumeration is capped (see [`SearchLimits`]). Under the cap everything is deterministic; once the cap bites,
//! re-running with a different [`EnumerationOrder::Shuffled`] seed is the supported way to look for alternative answers.
//!
//! When no cycle fixes an imbalance, an augmenting path from a synthetic source (everyone in the overfull section) to a
//! synthetic sink (everyone who would accept the underfull one) describes a chain of moves shifting one student's worth of occupancy.

pub use builder::{BuildError, BuilderInvalidReason, GraphBuilder};
pub use compat::CompatibilityTable;
pub use config::{Config, LoadError};
pub use cycles::Cycle;
pub use graph::{Node, PreferenceGraph};
pub use limits::{EnumerationOrder, SearchLimits};
pub use request::{Reason, Request, Student, Target};
pub use scheduler::{Rate, ScheduleReport, Strategy};
pub use selector::{Selection, Weighting};
pub use shift::{find_shift_paths, NoPathReason, ShiftAttempt, ShiftOutcome, ShiftPath, ShiftQuery, ShiftReport};
pub use slot::{Axis, ParseSlotError, Slot, SlotPair};

pub mod builder;
pub(crate) mod compat;
pub mod config;
pub mod cycles;
pub(crate) mod graph;
pub mod limits;
pub(crate) mod request;
pub mod scheduler;
pub mod selector;
pub mod shift;
pub(crate) mod slot;
mod tests;
pub mod validate;
