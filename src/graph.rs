use std::sync::Arc;

use itertools::Itertools;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::request::Student;

/// A student bound to the slot pair they held when the graph was built.
///
/// Nodes are numbered in ascending student-id order, so comparing nodes compares student ids.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct Node(pub(crate) usize);

impl Node {
    /// Position of the student in [`PreferenceGraph::students`].
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Who wants whose current slot.
///
/// An edge `a -> b` means the student at `a` would accept moving into the slot pair held at `b`.
/// Graphs are never edited in place once built; [`without`](Self::without) hands out a reduced copy instead,
/// so sibling search branches cannot observe each other's removals.
#[derive(Clone, Debug)]
pub struct PreferenceGraph {
    pub(crate) graph: DiGraphMap<Node, ()>,
    // shared by every reduced copy; indexed by `Node`
    pub(crate) students: Arc<[Student]>,
}

impl PreferenceGraph {
    /// The student at `node`, whether or not `node` is still present in this (possibly reduced) graph.
    #[inline]
    pub fn student(&self, node: Node) -> &Student {
        &self.students[node.0]
    }

    /// Every student the graph was originally built from.
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Nodes still present, ascending.
    pub fn nodes(&self) -> Vec<Node> {
        self.graph.nodes().sorted().collect_vec()
    }

    /// Nodes still present.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Desire edges still present.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `node` is still present.
    pub fn contains(&self, node: Node) -> bool {
        self.graph.contains_node(node)
    }

    /// Whether the student at `from` wants the slot pair held at `to`.
    pub fn has_edge(&self, from: Node, to: Node) -> bool {
        self.graph.contains_edge(from, to)
    }

    /// Nodes whose slot the student at `node` wants, ascending.
    pub fn successors(&self, node: Node) -> Vec<Node> {
        self.graph.neighbors_directed(node, Direction::Outgoing).sorted().collect_vec()
    }

    /// Look up the node of the student with identifier `id`, if still present.
    pub fn node_of(&self, id: &str) -> Option<Node> {
        self.students.binary_search_by(|s| s.id.as_str().cmp(id))
            .ok()
            .map(Node)
            .filter(|node| self.contains(*node))
    }

    /// Priority students still present.
    pub fn priority_count(&self) -> usize {
        self.graph.nodes().filter(|n| self.student(*n).priority()).count()
    }

    /// A copy of this graph with `nodes` (and their incident edges) removed.
    pub fn without(&self, nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut reduced = self.clone();
        for node in nodes {
            reduced.graph.remove_node(node);
        }
        reduced
    }
}
