//! Flattening a dependency tree into one version per `group:artifact`.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use pomdep_core::config::ConflictPolicy;
use pomdep_core::coordinate::Coordinate;
use pomdep_core::scope::Scope;

use crate::conflict::{ConflictReport, VersionConflict};
use crate::graph::DependencyTree;
use crate::mediator::{Arbitration, Candidate, VersionMediator};

/// The winning occurrence of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatDependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
    pub optional: bool,
    pub depth: usize,
    pub repository_id: Option<String>,
    /// The tree position this entry was taken from.
    pub node: NodeIndex,
}

#[derive(Debug, Clone, Default)]
pub struct FlattenResult {
    /// Winners in the breadth-first order their artifact was first reached.
    pub dependencies: Vec<FlatDependency>,
    pub conflicts: ConflictReport,
}

impl FlattenResult {
    pub fn get(&self, key: &str) -> Option<&FlatDependency> {
        self.dependencies.iter().find(|d| d.coordinate.ga() == key)
    }
}

/// Walk `tree` breadth-first (root excluded) and keep one occurrence per
/// `group:artifact` according to `policy`. Losing occurrences with a
/// different version are recorded as conflicts, never as errors.
///
/// Only the children of current winners are visited. When a later
/// occurrence displaces a winner, everything reached through the displaced
/// occurrence is withdrawn.
pub fn flatten(tree: &DependencyTree, policy: ConflictPolicy) -> FlattenResult {
    let mut conflicts = ConflictReport::new();
    let mut slots: Vec<Option<FlatDependency>> = Vec::new();
    let mut winners: HashMap<String, usize> = HashMap::new();
    let mut displaced: HashSet<NodeIndex> = HashSet::new();
    let mut queue: VecDeque<NodeIndex> = tree.children(tree.root()).into();

    while let Some(idx) = queue.pop_front() {
        if descends_from_any(tree, idx, &displaced) {
            continue;
        }
        let node = tree.node(idx);
        let challenger = FlatDependency {
            coordinate: node.coordinate(),
            scope: node.scope(),
            optional: node.dependency.is_optional(),
            depth: node.depth,
            repository_id: node.repository_id.clone(),
            node: idx,
        };
        let key = node.key();

        let incumbent = match winners.get(&key).and_then(|&slot| slots[slot].clone()) {
            Some(incumbent) => incumbent,
            None => {
                winners.insert(key, slots.len());
                slots.push(Some(challenger));
                queue.extend(tree.children(idx));
                continue;
            }
        };

        let verdict = VersionMediator::arbitrate(
            policy,
            Candidate {
                version: &incumbent.coordinate.version,
                depth: incumbent.depth,
            },
            Candidate {
                version: &challenger.coordinate.version,
                depth: challenger.depth,
            },
        );
        let (winner, loser) = match verdict {
            Arbitration::TakeChallenger => (&challenger, &incumbent),
            Arbitration::KeepIncumbent => (&incumbent, &challenger),
        };
        if winner.coordinate.version != loser.coordinate.version {
            let conflict = VersionConflict {
                key: key.clone(),
                requested: loser.coordinate.version.clone(),
                requested_depth: loser.depth,
                resolved: winner.coordinate.version.clone(),
                resolved_depth: winner.depth,
                policy,
            };
            tracing::debug!("{conflict}");
            conflicts.add(conflict);
        }
        if verdict == Arbitration::KeepIncumbent {
            continue;
        }

        displaced.insert(incumbent.node);
        for entry in slots.iter_mut() {
            let withdrawn = entry
                .as_ref()
                .is_some_and(|e| e.node != incumbent.node && descends_from(tree, e.node, incumbent.node));
            if withdrawn {
                if let Some(e) = entry.take() {
                    tracing::trace!("withdrawing {} reached through {}", e.coordinate, incumbent.coordinate);
                    winners.remove(&e.coordinate.ga());
                }
            }
        }
        if let Some(&slot) = winners.get(&key) {
            slots[slot] = Some(challenger);
        }
        queue.extend(tree.children(idx));
    }

    FlattenResult {
        dependencies: slots.into_iter().flatten().collect(),
        conflicts,
    }
}

fn descends_from(tree: &DependencyTree, idx: NodeIndex, ancestor: NodeIndex) -> bool {
    let mut current = tree.parent(idx);
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        current = tree.parent(parent);
    }
    false
}

fn descends_from_any(tree: &DependencyTree, idx: NodeIndex, ancestors: &HashSet<NodeIndex>) -> bool {
    if ancestors.is_empty() {
        return false;
    }
    let mut current = tree.parent(idx);
    while let Some(parent) = current {
        if ancestors.contains(&parent) {
            return true;
        }
        current = tree.parent(parent);
    }
    false
}
