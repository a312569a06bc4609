//! Per-node traversal, filtering and management strategies.
//!
//! Each strategy value is an immutable snapshot owned by one tree node.
//! `derive_child` builds the snapshot handed to that node's children and
//! never changes `self`.

use std::collections::HashMap;
use std::sync::Arc;

use pomdep_core::config::ResolverConfig;
use pomdep_core::coordinate::ManagementKey;
use pomdep_core::dependency::{Dependency, Exclusion};
use pomdep_core::scope::Scope;

use crate::graph::GraphNode;

/// Decides whether a node's dependencies are expanded at all.
pub trait DependencyTraverser: Clone {
    fn accept(&self, node: &GraphNode) -> bool;
    fn derive_child(&self, node: &GraphNode) -> Self;
}

/// Decides whether a candidate dependency of a node becomes a child.
pub trait DependencyFilter: Clone {
    fn accept(&self, node: &GraphNode, candidate: &Dependency) -> bool;
    fn derive_child(&self, node: &GraphNode) -> Self;
}

/// Fills unset fields of declared dependencies from dependency management.
pub trait DependencyManager: Clone {
    fn manage(&self, node: &GraphNode, dependency: &mut Dependency);
    fn derive_child(&self, node: &GraphNode) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTraverser {
    /// Expand every node.
    All,
    /// Do not expand nodes reached with one of these scopes. The root is
    /// always expanded.
    SkipScopes(Vec<Scope>),
}

impl ScopeTraverser {
    pub fn from_config(config: &ResolverConfig) -> Self {
        ScopeTraverser::SkipScopes(config.traversal.skip_scopes.clone())
    }
}

impl Default for ScopeTraverser {
    fn default() -> Self {
        ScopeTraverser::SkipScopes(vec![Scope::System])
    }
}

impl DependencyTraverser for ScopeTraverser {
    fn accept(&self, node: &GraphNode) -> bool {
        match self {
            ScopeTraverser::All => true,
            ScopeTraverser::SkipScopes(skip) => node.depth == 0 || !skip.contains(&node.scope()),
        }
    }

    fn derive_child(&self, _node: &GraphNode) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardFilter {
    AcceptAll,
    /// Exclusions accumulated along the path from the root.
    Exclusions(Arc<Vec<Exclusion>>),
    /// Drop optional dependencies of every module but the root.
    NonOptionalTransitive,
    /// Accept only what every member accepts.
    AllOf(Vec<StandardFilter>),
}

impl StandardFilter {
    /// Exclusion filtering, plus optional-dependency dropping unless
    /// `[traversal] include-optional` is set.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut filters = vec![StandardFilter::Exclusions(Arc::default())];
        if !config.traversal.include_optional {
            filters.push(StandardFilter::NonOptionalTransitive);
        }
        StandardFilter::AllOf(filters)
    }
}

impl Default for StandardFilter {
    fn default() -> Self {
        StandardFilter::from_config(&ResolverConfig::default())
    }
}

impl DependencyFilter for StandardFilter {
    fn accept(&self, node: &GraphNode, candidate: &Dependency) -> bool {
        match self {
            StandardFilter::AcceptAll => true,
            StandardFilter::Exclusions(exclusions) => !exclusions
                .iter()
                .any(|e| e.matches(&candidate.group_id, &candidate.artifact_id)),
            StandardFilter::NonOptionalTransitive => node.depth == 0 || !candidate.is_optional(),
            StandardFilter::AllOf(filters) => filters.iter().all(|f| f.accept(node, candidate)),
        }
    }

    fn derive_child(&self, node: &GraphNode) -> Self {
        match self {
            StandardFilter::Exclusions(exclusions) => {
                let added = &node.dependency.exclusions;
                if added.iter().all(|e| exclusions.contains(e)) {
                    return self.clone();
                }
                let mut merged = exclusions.as_ref().clone();
                for exclusion in added {
                    if !merged.contains(exclusion) {
                        merged.push(exclusion.clone());
                    }
                }
                StandardFilter::Exclusions(Arc::new(merged))
            }
            StandardFilter::AllOf(filters) => {
                StandardFilter::AllOf(filters.iter().map(|f| f.derive_child(node)).collect())
            }
            StandardFilter::AcceptAll | StandardFilter::NonOptionalTransitive => self.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassicManager {
    /// Leave declared dependencies untouched.
    Unmanaged,
    /// Management entries collected from the path so far. An ancestor's
    /// entry shadows any entry for the same key further down.
    Accumulated(Arc<HashMap<ManagementKey, Dependency>>),
}

impl Default for ClassicManager {
    fn default() -> Self {
        ClassicManager::Accumulated(Arc::default())
    }
}

impl DependencyManager for ClassicManager {
    fn manage(&self, _node: &GraphNode, dependency: &mut Dependency) {
        let ClassicManager::Accumulated(managed) = self else {
            return;
        };
        let Some(template) = managed.get(&dependency.management_key()) else {
            return;
        };
        if dependency.version.is_none() {
            dependency.version = template.version.clone();
        }
        if dependency.scope.is_none() {
            dependency.scope = template.scope;
        }
        if dependency.optional.is_none() {
            dependency.optional = template.optional;
        }
        if dependency.exclusions.is_empty() {
            dependency.exclusions = template.exclusions.clone();
        }
        if dependency.system_path.is_none() {
            dependency.system_path = template.system_path.clone();
        }
    }

    fn derive_child(&self, node: &GraphNode) -> Self {
        let ClassicManager::Accumulated(managed) = self else {
            return self.clone();
        };
        let Some(model) = &node.model else {
            return self.clone();
        };
        let fresh: Vec<_> = model
            .management
            .entries()
            .filter(|e| !managed.contains_key(&e.dependency.management_key()))
            .collect();
        if fresh.is_empty() {
            return self.clone();
        }
        let mut merged = managed.as_ref().clone();
        for entry in fresh {
            merged.insert(entry.dependency.management_key(), entry.dependency.clone());
        }
        ClassicManager::Accumulated(Arc::new(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_at(depth: usize, dependency: Dependency) -> GraphNode {
        let mut node = GraphNode::new(dependency);
        node.depth = depth;
        node
    }

    #[test]
    fn explicit_values_beat_managed() {
        let mut table = HashMap::new();
        table.insert(
            ManagementKey::new("g", "a"),
            Dependency::new("g", "a", Some("9.9")).with_scope(Scope::Test),
        );
        let manager = ClassicManager::Accumulated(Arc::new(table));
        let root = node_at(0, Dependency::new("r", "r", Some("1")));

        let mut explicit = Dependency::new("g", "a", Some("1.0")).with_scope(Scope::Runtime);
        manager.manage(&root, &mut explicit);
        assert_eq!(explicit.version.as_deref(), Some("1.0"));
        assert_eq!(explicit.scope, Some(Scope::Runtime));

        let mut bare = Dependency::new("g", "a", None);
        manager.manage(&root, &mut bare);
        assert_eq!(bare.version.as_deref(), Some("9.9"));
        assert_eq!(bare.scope, Some(Scope::Test));
    }

    #[test]
    fn exclusions_accumulate_down_the_path() {
        let filter = StandardFilter::Exclusions(Arc::default());
        let parent = node_at(1, Dependency::new("g", "m", Some("1")).with_exclusion("x", "*"));
        let child_filter = filter.derive_child(&parent);

        let excluded = Dependency::new("x", "anything", Some("1"));
        assert!(filter.accept(&parent, &excluded));
        assert!(!child_filter.accept(&parent, &excluded));
    }

    #[test]
    fn optional_dropped_below_root() {
        let filter = StandardFilter::NonOptionalTransitive;
        let optional = Dependency::new("g", "opt", Some("1")).with_optional(true);
        let root = node_at(0, Dependency::new("r", "r", Some("1")));
        let inner = node_at(1, Dependency::new("g", "m", Some("1")));
        assert!(filter.accept(&root, &optional));
        assert!(!filter.accept(&inner, &optional));
    }

    #[test]
    fn include_optional_config() {
        let mut config = ResolverConfig::default();
        config.traversal.include_optional = true;
        let filter = StandardFilter::from_config(&config);
        let inner = node_at(2, Dependency::new("g", "m", Some("1")));
        let optional = Dependency::new("g", "opt", Some("1")).with_optional(true);
        assert!(filter.accept(&inner, &optional));
    }

    #[test]
    fn traverser_skips_system_but_not_root() {
        let traverser = ScopeTraverser::default();
        let system = node_at(1, Dependency::new("g", "sys", Some("1")).with_scope(Scope::System));
        let root = node_at(0, Dependency::new("g", "r", Some("1")).with_scope(Scope::System));
        assert!(!traverser.accept(&system));
        assert!(traverser.accept(&root));
        assert!(ScopeTraverser::All.accept(&system));
    }
}
