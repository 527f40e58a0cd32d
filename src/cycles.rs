//! Simple-cycle enumeration over a [`PreferenceGraph`].

use std::collections::{HashMap, HashSet, VecDeque};

use itertools::Itertools;
use petgraph::Direction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::graph::{Node, PreferenceGraph};
use crate::limits::{Clock, SearchLimits};

/// A closed chain of desire edges: every student moves into the next student's slot pair, the last into the first's.
///
/// Executing a cycle leaves the occupancy of every slot pair unchanged.
/// Cycles are stored starting at their smallest node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Cycle(Vec<Node>);

impl Cycle {
    pub(crate) fn new(mut nodes: Vec<Node>) -> Self {
        if let Some(min_at) = nodes.iter().position_min() {
            nodes.rotate_left(min_at);
        }
        Self(nodes)
    }

    /// Nodes in execution order.
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    /// Number of students in the cycle.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cycle has no students.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `node` is part of the cycle.
    pub fn contains(&self, node: Node) -> bool {
        self.0.contains(&node)
    }

    /// How many students in this cycle have priority.
    pub fn priority_count(&self, graph: &PreferenceGraph) -> usize {
        self.0.iter().filter(|n| graph.student(**n).priority()).count()
    }

    /// Student display names in execution order.
    pub fn names(&self, graph: &PreferenceGraph) -> Vec<String> {
        self.0.iter().map(|n| graph.student(*n).name.clone()).collect_vec()
    }

    /// Student identifiers in execution order.
    pub fn ids<'g>(&self, graph: &'g PreferenceGraph) -> Vec<&'g str> {
        self.0.iter().map(|n| graph.student(*n).id.as_str()).collect_vec()
    }
}

/// List simple cycles of `graph`, longest first.
///
/// Stops once [`SearchLimits::max_cycles`] cycles are found. Below the cap the result is complete and independent of
/// [`SearchLimits::order`]; at the cap, which cycles survive depends on the order, and a different
/// [`Shuffled`](crate::limits::EnumerationOrder::Shuffled) seed may surface a different set.
/// Cycles of equal length are ordered by their node sequence.
pub fn enumerate(graph: &PreferenceGraph, limits: &SearchLimits) -> Vec<Cycle> {
    enumerate_until(graph, limits, &limits.clock())
}

pub(crate) fn enumerate_until(graph: &PreferenceGraph, limits: &SearchLimits, clock: &Clock) -> Vec<Cycle> {
    let mut enumerator = Enumerator {
        graph,
        clock,
        rng: limits.order.rng(),
        max_cycles: limits.max_cycles,
        rank: HashMap::with_capacity(graph.node_count()),
        path: Vec::new(),
        on_path: HashSet::new(),
        found: Vec::new(),
    };
    enumerator.run();

    let found = enumerator.found;
    debug!(nodes = graph.node_count(), cycles = found.len(), "enumerated cycles");

    found.into_iter()
        .sorted_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)))
        .collect_vec()
}

struct Enumerator<'a> {
    graph: &'a PreferenceGraph,
    clock: &'a Clock,
    rng: Option<StdRng>,
    max_cycles: usize,
    // position of each node in the walk order; a cycle is reported from its lowest-ranked node only
    rank: HashMap<Node, usize>,
    path: Vec<Node>,
    on_path: HashSet<Node>,
    found: Vec<Cycle>,
}

impl Enumerator<'_> {
    #[inline]
    fn full(&self) -> bool {
        self.found.len() >= self.max_cycles || self.clock.expired()
    }

    fn arrange(&mut self, nodes: &mut [Node]) {
        if let Some(rng) = self.rng.as_mut() {
            nodes.shuffle(rng);
        }
    }

    fn run(&mut self) {
        let mut order = self.graph.nodes();
        self.arrange(&mut order);
        self.rank = order.iter().enumerate().map(|(r, n)| (*n, r)).collect();

        for root in order {
            if self.full() {
                break;
            }

            let reaching = self.reaching(root);
            self.path.push(root);
            self.on_path.insert(root);
            self.search(root, root, &reaching);
            self.path.clear();
            self.on_path.clear();
        }
    }

    /// Nodes ranked at or above `root` that can get back to `root` without dropping below its rank.
    fn reaching(&self, root: Node) -> HashSet<Node> {
        let floor = self.rank[&root];
        let mut seen = HashSet::from([root]);
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            for prev in self.graph.graph.neighbors_directed(node, Direction::Incoming) {
                if self.rank[&prev] > floor && seen.insert(prev) {
                    queue.push_back(prev);
                }
            }
        }
        seen
    }

    fn search(&mut self, root: Node, node: Node, reaching: &HashSet<Node>) {
        let mut next = self.graph.successors(node);
        self.arrange(&mut next);

        for succ in next {
            if self.full() {
                return;
            }
            if succ == root {
                let cycle = Cycle::new(self.path.clone());
                trace!(len = cycle.len(), "found cycle");
                self.found.push(cycle);
            } else if reaching.contains(&succ) && !self.on_path.contains(&succ) {
                self.path.push(succ);
                self.on_path.insert(succ);
                self.search(root, succ, reaching);
                self.on_path.remove(&succ);
                self.path.pop();
            }
        }
    }
}
