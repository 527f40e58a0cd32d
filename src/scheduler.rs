//! Whole-graph schedules: which swap cycles to propose and how much of the backlog they clear.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, VariantArray};
use tracing::{debug, info};

use crate::cycles::Cycle;
use crate::graph::PreferenceGraph;
use crate::limits::SearchLimits;
use crate::selector::{select, Weighting};

/// Which students a schedule tries hardest to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, VariantArray, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Move as many students as possible, priority or not.
    AppealsFirst,
    /// Move as many priority students as possible, then as many of everyone left over.
    ConflictFirst,
}

/// `satisfied` out of `total`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rate {
    /// Students moved.
    pub satisfied: usize,
    /// Students counted.
    pub total: usize,
}

impl Rate {
    /// Percentage rounded to two decimals, or `None` if there is nobody to count.
    pub fn percent(&self) -> Option<f64> {
        (self.total > 0).then(|| (self.satisfied as f64 * 10_000.0 / self.total as f64).round() / 100.0)
    }
}

impl Display for Rate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.percent() {
            Some(percent) => write!(f, "{:.2}%", percent),
            None => write!(f, "n/a"),
        }
    }
}

/// Proposed swap cycles and how much of the request backlog they clear.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleReport {
    /// Strategy that produced the report.
    pub strategy: Strategy,
    /// Student names per cycle, in execution order: each moves into the next one's sections, the last into the first's.
    pub chains: Vec<Vec<String>>,
    /// Student ids, parallel to `chains`.
    pub ids: Vec<Vec<String>>,
    /// All students moved, out of every node.
    pub overall: Rate,
    /// Priority students moved, out of every priority node.
    pub priority: Rate,
    /// Some phase ran out of time.
    pub truncated: bool,
}

impl ScheduleReport {
    fn new(strategy: Strategy, graph: &PreferenceGraph, cycles: &[Cycle], truncated: bool) -> Self {
        let report = Self {
            strategy,
            chains: cycles.iter().map(|c| c.names(graph)).collect_vec(),
            ids: cycles.iter()
                .map(|c| c.ids(graph).into_iter().map(str::to_owned).collect_vec())
                .collect_vec(),
            overall: Rate {
                satisfied: cycles.iter().map(Cycle::len).sum(),
                total: graph.node_count(),
            },
            priority: Rate {
                satisfied: cycles.iter().map(|c| c.priority_count(graph)).sum(),
                total: graph.priority_count(),
            },
            truncated,
        };
        info!(
            %strategy,
            cycles = report.chains.len(),
            overall = %report.overall,
            priority = %report.priority,
            "schedule ready"
        );
        report
    }

    /// Whether no cycle was found.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Display for ScheduleReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let heading = match self.strategy {
            Strategy::AppealsFirst => "Best cycles for appeals",
            Strategy::ConflictFirst => "Best cycles for schedule conflicts",
        };

        if self.is_empty() {
            return writeln!(f, "{}: no swap cycles found.", heading);
        }

        writeln!(
            f,
            "{} ({} of appeals fixed; {} of schedule conflicts fixed){}:",
            heading,
            self.overall,
            self.priority,
            if self.truncated { " [search cut short]" } else { "" }
        )?;
        for (i, chain) in self.chains.iter().enumerate() {
            writeln!(f, "\t{}. {}", i + 1, chain.join(" -> "))?;
        }
        Ok(())
    }
}

/// Run one full pass of `strategy` over `graph`.
pub fn schedule(graph: &PreferenceGraph, strategy: Strategy, limits: &SearchLimits) -> ScheduleReport {
    match strategy {
        Strategy::AppealsFirst => appeals_first(graph, limits),
        Strategy::ConflictFirst => conflict_first(graph, limits),
    }
}

/// One unweighted selection over the whole graph.
pub fn appeals_first(graph: &PreferenceGraph, limits: &SearchLimits) -> ScheduleReport {
    let selection = select(graph, Weighting::Unweighted, limits);
    ScheduleReport::new(Strategy::AppealsFirst, graph, &selection.cycles, selection.truncated)
}

/// Priority-weighted selection first; then, with everyone it moved taken out, an unweighted selection over the rest.
///
/// This may move fewer students in total than [`appeals_first`] in exchange for covering more priority students.
pub fn conflict_first(graph: &PreferenceGraph, limits: &SearchLimits) -> ScheduleReport {
    let priority_phase = select(graph, Weighting::PriorityWeighted, limits);
    let remaining = graph.without(priority_phase.students());
    debug!(
        moved = priority_phase.satisfied_count(),
        remaining = remaining.node_count(),
        "priority phase done"
    );

    let rest_phase = select(&remaining, Weighting::Unweighted, limits);

    let cycles = priority_phase.cycles.iter()
        .chain(rest_phase.cycles.iter())
        .cloned()
        .collect_vec();
    ScheduleReport::new(
        Strategy::ConflictFirst,
        graph,
        &cycles,
        priority_phase.truncated || rest_phase.truncated,
    )
}
