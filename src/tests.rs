#[cfg(test)]
mod tests {
    use std::time::Duration;

    use itertools::Itertools;

    use crate::builder::{BuilderInvalidReason, GraphBuilder};
    use crate::compat::CompatibilityTable;
    use crate::config::Config;
    use crate::cycles::{enumerate, Cycle};
    use crate::graph::PreferenceGraph;
    use crate::limits::{EnumerationOrder, SearchLimits};
    use crate::request::{Reason, Request, Target};
    use crate::scheduler::{appeals_first, conflict_first, Rate};
    use crate::selector::{select, Weighting};
    use crate::shift::{find_shift_paths, NoPathReason, ShiftOutcome, ShiftQuery};
    use crate::slot::{Axis, Slot, SlotPair};
    use crate::validate::{NoopValidator, Roster, RosterValidator, ValidationIssue, Validator};

    // section k is recitation Rk with Rina and tutorial Tk with Tom
    fn section(k: usize) -> SlotPair {
        SlotPair::new(Slot::new(format!("R{k}"), "Rina"), Slot::new(format!("T{k}"), "Tom"))
    }

    fn compat() -> CompatibilityTable {
        CompatibilityTable::from_pairs([("Rina", "Tom"), ("Zed", "Zoe")])
    }

    fn request(id: &str, reason: &str, current: SlotPair, recitations: Vec<String>, tutorials: Vec<String>) -> Request {
        Request {
            id: id.to_owned(),
            name: id.to_uppercase(),
            reason: reason.to_owned(),
            current,
            desired_recitations: recitations,
            desired_tutorials: tutorials,
            resolved: false,
        }
    }

    /// A preference request from a student in section `at` for any of `targets`.
    fn wants(id: &str, at: usize, targets: &[usize]) -> Request {
        request(
            id,
            "Team preference",
            section(at),
            targets.iter().map(|k| format!("R{k} with Rina")).collect(),
            targets.iter().map(|k| format!("T{k} with Tom")).collect(),
        )
    }

    /// A conflict request from a student in section `at` free at the times of `targets`.
    fn needs(id: &str, at: usize, targets: &[usize]) -> Request {
        request(
            id,
            "Schedule conflict",
            section(at),
            targets.iter().map(|k| format!("R{k}")).collect(),
            targets.iter().map(|k| format!("T{k}")).collect(),
        )
    }

    fn build(requests: Vec<Request>) -> PreferenceGraph {
        GraphBuilder::with_compatibility(compat())
            .add_requests(requests)
            .build()
            .unwrap()
    }

    fn ids(graph: &PreferenceGraph, cycle: &Cycle) -> Vec<String> {
        cycle.ids(graph).into_iter().map(str::to_owned).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// a -> b -> c -> a, with b the only priority student.
    fn triangle() -> Vec<Request> {
        vec![wants("a", 1, &[2]), needs("b", 2, &[3]), wants("c", 3, &[1])]
    }

    /// An `n`-student roster where everyone wants everyone else's section.
    fn complete(n: usize) -> PreferenceGraph {
        build((1..=n)
            .map(|k| wants(&format!("s{k}"), k, &(1..=n).filter(|j| *j != k).collect_vec()))
            .collect())
    }

    #[test]
    fn reason_spellings() {
        assert_eq!("Team preference".parse::<Reason>().unwrap(), Reason::Preference);
        assert_eq!("schedule Conflict".parse::<Reason>().unwrap(), Reason::Conflict);
        assert_eq!("conflict".parse::<Reason>().unwrap(), Reason::Conflict);
        assert!("I just feel like it".parse::<Reason>().is_err());
        assert_eq!(Reason::Preference.to_string(), "preference");
    }

    #[test]
    fn one_node_per_student() {
        let mut requests = triangle();
        requests.push(wants("d", 4, &[]));
        let mut resolved = wants("e", 5, &[1]);
        resolved.resolved = true;
        requests.push(resolved);

        let graph = build(requests);
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.nodes().len(), graph.nodes().into_iter().unique().count());
        for id in ["a", "b", "c", "d"] {
            assert!(graph.node_of(id).is_some(), "{id} missing");
        }
        assert!(graph.node_of("e").is_none());
        // d asked for nothing, which is not an error
        assert!(graph.successors(graph.node_of("d").unwrap()).is_empty());
    }

    #[test]
    fn unknown_reason_fails_whole_build() {
        let mut requests = triangle();
        requests.push(request("x", "vibes", section(4), vec![], vec![]));

        let err = GraphBuilder::with_compatibility(compat())
            .add_requests(requests)
            .build()
            .unwrap_err();
        assert_eq!(err.0, vec![BuilderInvalidReason::UnknownReason { id: "x".into(), reason: "vibes".into() }]);
    }

    #[test]
    fn malformed_and_duplicate_requests_are_reported_together() {
        let mut builder = GraphBuilder::with_compatibility(compat());
        builder
            .add_request(request("a", "preference", section(1), strings(&["R2"]), strings(&["T2 with Tom"])))
            .add_request(wants("b", 2, &[1]))
            .add_request(wants("b", 3, &[1]));

        let reasons = builder.is_valid().unwrap();
        assert_eq!(reasons.len(), 2);
        assert!(matches!(reasons[0], BuilderInvalidReason::MalformedSlot { ref id, .. } if id == "a"));
        assert_eq!(reasons[1], BuilderInvalidReason::DuplicateStudent { id: "b".into() });
        assert!(builder.build().is_err());
    }

    #[test]
    fn preference_filtered_by_compatibility() {
        let graph = build(vec![
            // Rina never teaches alongside Zoe, so this request cannot match anyone
            request("a", "preference", section(1), strings(&["R2 with Rina"]), strings(&["T2 with Zoe"])),
            wants("b", 2, &[1]),
        ]);
        let a = graph.node_of("a").unwrap();
        assert!(graph.successors(a).is_empty());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn preference_requires_exact_instructors() {
        let zed = SlotPair::new(Slot::new("R2", "Zed"), Slot::new("T2", "Zoe"));
        let graph = build(vec![
            wants("a", 1, &[2]),
            request("b", "preference", zed, vec![], vec![]),
        ]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn conflict_matches_time_only() {
        let zed = SlotPair::new(Slot::new("R2", "Zed"), Slot::new("T2", "Zoe"));
        let graph = build(vec![
            needs("a", 1, &[2]),
            request("b", "preference", zed, vec![], vec![]),
            wants("c", 2, &[]),
        ]);
        let a = graph.node_of("a").unwrap();
        assert_eq!(graph.successors(a), vec![graph.node_of("b").unwrap(), graph.node_of("c").unwrap()]);
    }

    #[test]
    fn conflict_blank_axis_has_no_targets() {
        let graph = build(vec![
            request("a", "conflict", section(1), strings(&["R2"]), vec![]),
            // same recitation time as a's request, same tutorial time as a currently has
            request("b", "preference", SlotPair::new(Slot::new("R2", "Rina"), Slot::new("T1", "Tom")), vec![], vec![]),
            wants("c", 2, &[]),
        ]);
        let a = graph.node_of("a").unwrap();
        assert!(graph.student(a).targets.is_empty());
        assert!(graph.successors(a).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn no_edges_into_own_section() {
        let graph = build(vec![needs("a", 1, &[1, 2]), needs("b", 1, &[1])]);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn enumerated_cycles_are_simple_and_closed() {
        let graph = complete(5);
        let cycles = enumerate(&graph, &SearchLimits::default());

        // directed K5: sum over k of C(5, k) * (k - 1)!
        assert_eq!(cycles.len(), 10 + 20 + 30 + 24);
        for cycle in &cycles {
            assert_eq!(cycle.nodes().iter().unique().count(), cycle.len());
            for (from, to) in cycle.nodes().iter().circular_tuple_windows() {
                assert!(graph.has_edge(*from, *to));
            }
        }
        assert!(cycles.windows(2).all(|w| w[0].len() >= w[1].len()));
        assert_eq!(cycles.iter().unique().count(), cycles.len());
    }

    #[test]
    fn enumeration_respects_cap() {
        let graph = complete(5);
        let limits = SearchLimits::default().with_max_cycles(10);
        assert_eq!(enumerate(&graph, &limits).len(), 10);

        let shuffled = limits.with_order(EnumerationOrder::Shuffled { seed: 11 });
        let cycles = enumerate(&graph, &shuffled);
        assert_eq!(cycles.len(), 10);
        for cycle in &cycles {
            for (from, to) in cycle.nodes().iter().circular_tuple_windows() {
                assert!(graph.has_edge(*from, *to));
            }
        }
    }

    #[test]
    fn reseeding_at_cap_surfaces_other_cycles() {
        let graph = complete(5);
        let limits = SearchLimits::default().with_max_cycles(10);
        let canonical = enumerate(&graph, &limits).into_iter().sorted().collect_vec();

        let reseeded = (1..=10)
            .map(|seed| enumerate(&graph, &limits.with_order(EnumerationOrder::Shuffled { seed })))
            .map(|cycles| cycles.into_iter().sorted().collect_vec())
            .collect_vec();
        assert!(reseeded.iter().any(|cycles| *cycles != canonical));
        // same seed, same answer
        assert_eq!(
            enumerate(&graph, &limits.with_order(EnumerationOrder::Shuffled { seed: 4 })).into_iter().sorted().collect_vec(),
            reseeded[3]
        );
    }

    #[test]
    fn order_is_irrelevant_below_cap() {
        let graph = complete(4);
        let canonical = enumerate(&graph, &SearchLimits::default());
        for seed in [1, 2, 3] {
            let limits = SearchLimits::default().with_order(EnumerationOrder::Shuffled { seed });
            assert_eq!(enumerate(&graph, &limits), canonical);
        }
    }

    #[test]
    fn triangle_cycle() {
        let graph = build(triangle());
        let cycles = enumerate(&graph, &SearchLimits::default());
        assert_eq!(cycles.len(), 1);
        assert_eq!(ids(&graph, &cycles[0]), strings(&["a", "b", "c"]));

        let unweighted = select(&graph, Weighting::Unweighted, &SearchLimits::default());
        assert_eq!(unweighted.score, 3);
        let weighted = select(&graph, Weighting::PriorityWeighted, &SearchLimits::default());
        assert_eq!(weighted.score, 1);
    }

    #[test]
    fn disjoint_pairs_both_selected() {
        let graph = build(vec![wants("d", 4, &[5]), wants("e", 5, &[4]), wants("f", 6, &[7]), wants("g", 7, &[6])]);
        let selection = select(&graph, Weighting::Unweighted, &SearchLimits::default());

        assert_eq!(selection.score, 4);
        assert!(selection.is_disjoint());
        let chosen = selection.cycles.iter().map(|c| ids(&graph, c)).sorted().collect_vec();
        assert_eq!(chosen, vec![strings(&["d", "e"]), strings(&["f", "g"])]);
    }

    #[test]
    fn overlapping_cycles_never_both_selected() {
        let graph = build(vec![wants("a", 1, &[2]), wants("b", 2, &[3]), wants("c", 3, &[1, 4]), wants("d", 4, &[3])]);
        assert_eq!(enumerate(&graph, &SearchLimits::default()).len(), 2);

        let selection = select(&graph, Weighting::Unweighted, &SearchLimits::default());
        assert_eq!(selection.score, 3);
        assert_eq!(selection.cycles.len(), 1);
        assert_eq!(ids(&graph, &selection.cycles[0]), strings(&["a", "b", "c"]));
    }

    fn contested() -> PreferenceGraph {
        // a -> b -> c -> a carries the only priority student (b),
        // c -> d -> e -> h -> c is longer, and f <-> g is independent of both
        build(vec![
            wants("a", 1, &[2]),
            needs("b", 2, &[3]),
            wants("c", 3, &[1, 4]),
            wants("d", 4, &[5]),
            wants("e", 5, &[8]),
            wants("f", 6, &[7]),
            wants("g", 7, &[6]),
            wants("h", 8, &[3]),
        ])
    }

    #[test]
    fn selector_is_exact_over_enumerated_cycles() {
        let graph = contested();
        let cycles = enumerate(&graph, &SearchLimits::default());

        for weighting in [Weighting::Unweighted, Weighting::PriorityWeighted] {
            let brute = cycles.iter()
                .powerset()
                .filter(|subset| subset.iter().flat_map(|c| c.nodes()).all_unique())
                .map(|subset| subset.iter().map(|c| weighting.weight(c, &graph)).sum::<usize>())
                .max()
                .unwrap();
            let selection = select(&graph, weighting, &SearchLimits::default());
            assert_eq!(selection.score, brute, "{weighting}");
            assert!(selection.is_disjoint());
        }
    }

    #[test]
    fn priority_score_never_exceeds_unweighted() {
        for graph in [contested(), build(triangle()), complete(4)] {
            for weighting in [Weighting::Unweighted, Weighting::PriorityWeighted] {
                let selection = select(&graph, weighting, &SearchLimits::default());
                assert!(selection.priority_satisfied(&graph) <= selection.satisfied_count());
            }
        }
    }

    #[test]
    fn appeals_first_maximizes_total() {
        let graph = contested();
        let report = appeals_first(&graph, &SearchLimits::default());

        assert_eq!(report.ids, vec![strings(&["c", "d", "e", "h"]), strings(&["f", "g"])]);
        assert_eq!(report.overall, Rate { satisfied: 6, total: 8 });
        assert_eq!(report.priority, Rate { satisfied: 0, total: 1 });
        assert_eq!(report.overall.percent(), Some(75.0));
    }

    #[test]
    fn conflict_first_prioritizes_conflicts() {
        let graph = contested();
        let report = conflict_first(&graph, &SearchLimits::default());

        assert_eq!(report.ids, vec![strings(&["a", "b", "c"]), strings(&["f", "g"])]);
        assert_eq!(report.overall, Rate { satisfied: 5, total: 8 });
        assert_eq!(report.priority, Rate { satisfied: 1, total: 1 });
        assert_eq!(report.overall.to_string(), "62.50%");

        let moved = report.ids.iter().flatten().collect_vec();
        assert_eq!(moved.len(), moved.iter().unique().count());
    }

    #[test]
    fn report_display() {
        let graph = build(triangle());
        let report = appeals_first(&graph, &SearchLimits::default());
        assert_eq!(
            format!("{}", report),
            "Best cycles for appeals (100.00% of appeals fixed; 100.00% of schedule conflicts fixed):\n\t1. A -> B -> C\n"
        );

        let empty = appeals_first(&build(vec![wants("a", 1, &[2])]), &SearchLimits::default());
        assert!(empty.is_empty());
        assert_eq!(empty.overall.percent(), Some(0.0));
        assert_eq!(empty.priority.to_string(), "n/a");
    }

    #[test]
    fn rate_rounding() {
        assert_eq!(Rate { satisfied: 2, total: 3 }.percent(), Some(66.67));
        assert_eq!(Rate { satisfied: 0, total: 0 }.percent(), None);
    }

    #[test]
    fn expired_deadline_truncates() {
        let graph = complete(5);
        let limits = SearchLimits::default().with_deadline(Duration::ZERO);
        let selection = select(&graph, Weighting::Unweighted, &limits);
        assert!(selection.truncated);
        assert!(selection.is_disjoint());
    }

    fn shift_roster() -> PreferenceGraph {
        build(vec![
            // p and q sit in recitation R1
            wants("p", 1, &[2]),
            wants("q", 1, &[9]),
            // m holds what p wants and needs R9
            needs("m", 2, &[9]),
            // n wants R9 too but nobody can reach n
            wants("n", 3, &[9]),
        ])
    }

    fn shift_query(from: &[&str], to: &[&str]) -> ShiftQuery {
        ShiftQuery {
            from: from.iter().map(|s| s.parse().unwrap()).collect(),
            to: to.iter().map(|s| s.parse().unwrap()).collect(),
            axis: Axis::Recitation,
        }
    }

    #[test]
    fn shift_ranks_longer_chains_first() {
        let graph = shift_roster();
        let report = find_shift_paths(&graph, &shift_query(&["R1 with Rina"], &["R9 with Rina"]), &SearchLimits::default());

        assert!(report.any_found());
        let ShiftOutcome::Found { by_length, by_priority, truncated } = &report.attempts[0].outcome else {
            panic!("expected paths");
        };
        assert!(!*truncated);
        assert_eq!(by_length.iter().map(|p| p.ids.clone()).collect_vec(), vec![strings(&["p", "m"]), strings(&["q"])]);
        assert_eq!(by_priority[0].ids, strings(&["p", "m"]));
        assert_eq!(by_priority[0].priority, 1);
        assert_eq!(by_priority[0].names, strings(&["P", "M"]));

        // the search runs on a private copy
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn shift_through_intermediate_student() {
        // x leaves R1 for y's sections, y takes w's, and w lands in R9
        let graph = build(vec![wants("x", 1, &[2]), wants("y", 2, &[3]), needs("w", 3, &[9])]);
        let report = find_shift_paths(&graph, &shift_query(&["R1 with Rina"], &["R9 with Rina"]), &SearchLimits::default());

        let ShiftOutcome::Found { by_length, by_priority, .. } = &report.attempts[0].outcome else {
            panic!("expected paths");
        };
        assert_eq!(by_length.len(), 1);
        assert_eq!(by_length[0].ids, strings(&["x", "y", "w"]));
        assert_eq!(by_priority[0].priority, 1);
    }

    #[test]
    fn shift_reports_each_combination() {
        let graph = shift_roster();
        let query = shift_query(&["R7 with Rina", "R1 with Rina"], &["R9 with Rina", "R5 with Rina"]);
        let report = find_shift_paths(&graph, &query, &SearchLimits::default());

        let outcomes = report.attempts.iter()
            .map(|a| (a.from.time.as_str(), a.to.time.as_str(), &a.outcome))
            .collect_vec();
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].2, &ShiftOutcome::NoPath { reason: NoPathReason::SourceIsolated });
        assert_eq!(outcomes[3].2, &ShiftOutcome::NoPath { reason: NoPathReason::SinkIsolated });
        assert!(matches!(outcomes[2].2, ShiftOutcome::Found { .. }));
        assert!(report.any_found());

        let hopeless = find_shift_paths(&graph, &shift_query(&["R3 with Rina"], &["R1 with Rina"]), &SearchLimits::default());
        assert!(!hopeless.any_found());
    }

    #[test]
    fn shift_unreachable_sink() {
        let graph = build(vec![wants("p", 1, &[]), wants("n", 3, &[9])]);
        let report = find_shift_paths(&graph, &shift_query(&["R1 with Rina"], &["R9 with Rina"]), &SearchLimits::default());
        assert_eq!(report.attempts[0].outcome, ShiftOutcome::NoPath { reason: NoPathReason::Unreachable });
    }

    #[test]
    fn shift_path_cap() {
        let graph = shift_roster();
        let limits = SearchLimits { max_paths: Some(1), ..SearchLimits::default() };
        let report = find_shift_paths(&graph, &shift_query(&["R1 with Rina"], &["R9 with Rina"]), &limits);
        let ShiftOutcome::Found { by_length, truncated, .. } = &report.attempts[0].outcome else {
            panic!("expected paths");
        };
        assert_eq!(by_length.len(), 1);
        assert!(*truncated);

        // a zero cap collects nothing, which is not evidence that no path exists
        let limits = SearchLimits { max_paths: Some(0), ..SearchLimits::default() };
        let report = find_shift_paths(&graph, &shift_query(&["R1 with Rina"], &["R9 with Rina"]), &limits);
        assert_eq!(report.attempts[0].outcome, ShiftOutcome::Found { by_length: vec![], by_priority: vec![], truncated: true });
        assert!(report.any_found());
    }

    #[test]
    fn roster_validation() {
        let requests = vec![
            wants("a", 1, &[2]),
            wants("b", 2, &[1]),
            request("c", "preference", section(3), strings(&["R1 with Rina"]), strings(&["T1 with Zoe"])),
            // blank entries only; nothing was really asked for
            request("d", "preference", section(6), strings(&[" "]), strings(&[""])),
            wants("ghost", 4, &[1]),
        ];
        let roster: Roster = [
            ("a".to_string(), section(1)),
            ("b".to_string(), section(5)),
            ("c".to_string(), section(3)),
            ("d".to_string(), section(6)),
        ].into_iter().collect();

        let issues = RosterValidator.validate(&requests, &roster, &compat());
        assert_eq!(issues, vec![
            ValidationIssue::CurrentMismatch { id: "b".into(), claimed: section(2), actual: section(5) },
            ValidationIssue::NoCompatibleTarget { id: "c".into() },
            ValidationIssue::NotOnRoster { id: "ghost".into() },
        ]);
        assert!(NoopValidator.validate(&requests, &roster, &compat()).is_empty());
    }

    #[test]
    fn config_from_json() {
        let config: Config = serde_json::from_str(r#"{
            "compatibility": [["Rina", "Tom"]],
            "limits": { "max_cycles": 50, "deadline": 2000, "order": { "kind": "shuffled", "seed": 3 } },
            "shifts": [{ "from": ["R1 with Rina"], "to": ["R2 with Rina"], "axis": "tutorial" }]
        }"#).unwrap();

        assert!(config.compatibility.contains("Rina", "Tom"));
        assert_eq!(config.limits.max_cycles, 50);
        assert_eq!(config.limits.deadline, Some(Duration::from_secs(2)));
        assert_eq!(config.limits.order, EnumerationOrder::Shuffled { seed: 3 });
        assert_eq!(config.shifts[0].axis, Axis::Tutorial);
        assert_eq!(config.shifts[0].to, vec![Slot::new("R2", "Rina")]);

        let defaults: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.limits, SearchLimits::default());
    }

    #[test]
    fn request_from_json() {
        let request: Request = serde_json::from_str(r#"{
            "id": "jdoe",
            "name": "Jane Doe",
            "reason": "Schedule conflict",
            "current": { "recitation": "TR 12-1pm with Lili Wilson", "tutorial": "F 1-2pm with Sarah Bates" },
            "desired_recitations": ["TR 2-3pm"],
            "desired_tutorials": ["F 2-3pm", " "]
        }"#).unwrap();

        assert_eq!(request.current.recitation, Slot::new("TR 12-1pm", "Lili Wilson"));
        assert_eq!(request.desired_tutorials.len(), 2);
        assert!(!request.resolved);

        let graph = build(vec![request]);
        assert_eq!(graph.priority_count(), 1);
        assert_eq!(graph.student(graph.node_of("jdoe").unwrap()).targets.len(), 1);
        assert_eq!(graph.student(graph.node_of("jdoe").unwrap()).targets[0], Target::Times {
            recitation: "TR 2-3pm".into(),
            tutorial: "F 2-3pm".into(),
        });
    }
}
