//! The resolved dependency tree, backed by petgraph.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use pomdep_core::coordinate::Coordinate;
use pomdep_core::dependency::Dependency;
use pomdep_core::scope::Scope;

use crate::model::EffectiveModel;

/// One resolved position in the tree.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// The dependency as resolved: concrete version, effective scope,
    /// merged exclusions.
    pub dependency: Dependency,
    /// `None` when the descriptor could not be resolved.
    pub model: Option<Arc<EffectiveModel>>,
    pub repository_id: Option<String>,
    /// Coordinates relocated away from, in order.
    pub relocations: Vec<Coordinate>,
    pub depth: usize,
}

impl GraphNode {
    pub fn new(dependency: Dependency) -> Self {
        Self {
            dependency,
            model: None,
            repository_id: None,
            relocations: Vec::new(),
            depth: 0,
        }
    }

    pub fn with_model(mut self, model: Option<Arc<EffectiveModel>>) -> Self {
        self.repository_id = model.as_ref().map(|m| m.repository_id.clone());
        self.model = model;
        self
    }

    pub fn with_relocations(mut self, relocations: Vec<Coordinate>) -> Self {
        self.relocations = relocations;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        self.dependency
            .coordinate_with_version(self.dependency.version.as_deref().unwrap_or_default())
    }

    /// `group:artifact`
    pub fn key(&self) -> String {
        self.dependency.ga()
    }

    pub fn version(&self) -> &str {
        self.dependency.version.as_deref().unwrap_or_default()
    }

    pub fn scope(&self) -> Scope {
        self.dependency.scope_or_default()
    }

    pub fn is_resolved(&self) -> bool {
        self.model.is_some()
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coordinate())?;
        if self.depth > 0 {
            write!(f, " ({}", self.scope())?;
            if self.dependency.is_optional() {
                f.write_str(", optional")?;
            }
            f.write_str(")")?;
        }
        if let Some(first) = self.relocations.first() {
            write!(f, " [relocated from {first}]")?;
        }
        if !self.is_resolved() && self.scope() != Scope::System {
            f.write_str(" (unresolved)")?;
        }
        Ok(())
    }
}

/// Edge label: how the child was reached.
#[derive(Debug, Clone)]
pub struct DepEdge {
    pub scope: Scope,
    pub optional: bool,
}

/// A rooted tree of [`GraphNode`]s. Children keep insertion order.
///
/// The same artifact may appear at several positions (diamonds); each
/// position is its own node.
#[derive(Debug)]
pub struct DependencyTree {
    graph: DiGraph<GraphNode, DepEdge>,
    root: NodeIndex,
}

impl DependencyTree {
    pub fn new(mut root: GraphNode) -> Self {
        root.depth = 0;
        let mut graph = DiGraph::new();
        let root = graph.add_node(root);
        Self { graph, root }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn root_node(&self) -> &GraphNode {
        &self.graph[self.root]
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Attach `node` below `parent`, fixing its depth to `parent`'s plus one.
    pub fn add_child(&mut self, parent: NodeIndex, mut node: GraphNode) -> NodeIndex {
        node.depth = self.graph[parent].depth + 1;
        let edge = DepEdge {
            scope: node.scope(),
            optional: node.dependency.is_optional(),
        };
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, edge);
        idx
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| e.source())
    }

    /// Children of `idx` in the order they were attached.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    pub fn edge(&self, child: NodeIndex) -> Option<&DepEdge> {
        self.graph
            .edges_directed(child, Direction::Incoming)
            .next()
            .map(|e| e.weight())
    }

    /// Node indices in depth-first pre-order.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.children(idx).into_iter().rev());
        }
        order
    }

    /// Node indices in breadth-first order, root first.
    pub fn breadth_first(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut queue = VecDeque::from([self.root]);
        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            queue.extend(self.children(idx));
        }
        order
    }

    /// Every node whose `group:artifact` is `key`, or whose artifact ID is
    /// `key` when it contains no `:`, in pre-order.
    pub fn find(&self, key: &str) -> Vec<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|&idx| {
                let dep = &self.graph[idx].dependency;
                if key.contains(':') {
                    dep.ga() == key
                } else {
                    dep.artifact_id == key
                }
            })
            .collect()
    }

    /// Nodes from the root down to the first match of `key`.
    pub fn path_to(&self, key: &str) -> Option<Vec<&GraphNode>> {
        let target = self.find(key).into_iter().next()?;
        let mut path = vec![target];
        let mut current = target;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        Some(path.into_iter().map(|idx| &self.graph[idx]).collect())
    }

    /// Render the tree with box-drawing connectors, stopping below `max_depth`.
    pub fn render(&self, max_depth: Option<usize>) -> String {
        let mut output = format!("{}\n", self.root_node());
        let children = self.children(self.root);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.render_subtree(&mut output, child, "", i == count - 1, max_depth);
        }
        output
    }

    fn render_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        max_depth: Option<usize>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let node = &self.graph[idx];
        output.push_str(&format!("{prefix}{connector}{node}\n"));

        if max_depth.is_some_and(|max| node.depth >= max) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.render_subtree(output, child, &child_prefix, i == count - 1, max_depth);
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() <= 1
    }
}
