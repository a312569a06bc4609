//! Dependency tree construction.
//!
//! The tree is expanded depth-first from the root. Every node carries its own
//! traverser, manager, filter, reader and ancestor chain, derived once from
//! its parent's. Recoverable problems are collected and the affected edge or
//! subtree is skipped; a dependency without any version and a parent-chain
//! cycle abort the build, returning the tree built so far.

use miette::Diagnostic;
use petgraph::graph::NodeIndex;
use thiserror::Error;

use pomdep_core::config::{ConflictPolicy, ResolverConfig};
use pomdep_core::coordinate::Coordinate;
use pomdep_core::dependency::Dependency;
use pomdep_core::problem::{Problem, ProblemCollector, ProblemKind, Severity};
use pomdep_core::scope::Scope;
use pomdep_util::errors::PomdepError;

use crate::cycle::CycleGuard;
use crate::flatten::{flatten, FlattenResult};
use crate::graph::{DependencyTree, GraphNode};
use crate::management::ManagementRequest;
use crate::mediator::VersionMediator;
use crate::model::EffectiveModelBuilder;
use crate::reader::RepositoryReader;
use crate::relocation::{RelocationOutcome, RelocationResolver};
use crate::scope::ScopeResolver;
use crate::strategy::{
    ClassicManager, DependencyFilter, DependencyManager, DependencyTraverser, ScopeTraverser,
    StandardFilter,
};
use crate::version::VersionConstraint;

/// A completed tree with every non-fatal problem met while building it.
#[derive(Debug)]
pub struct Resolution {
    pub tree: DependencyTree,
    pub problems: Vec<Problem>,
}

impl Resolution {
    pub fn flatten(&self, policy: ConflictPolicy) -> FlattenResult {
        flatten(&self.tree, policy)
    }

    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Error)
    }
}

/// A build aborted by a fatal problem.
#[derive(Debug, Error, Diagnostic)]
#[error("{error}")]
#[diagnostic(forward(error))]
pub struct ResolutionFailure {
    pub error: PomdepError,
    /// Everything collected up to the failure, the fatal problem included.
    pub problems: Vec<Problem>,
    /// The tree as far as it was built.
    pub partial: Option<DependencyTree>,
}

type Expansion = Result<DependencyTree, (PomdepError, Option<DependencyTree>)>;

struct Frame<R, T, M, F> {
    node: NodeIndex,
    traverser: T,
    manager: M,
    filter: F,
    reader: R,
    path: CycleGuard,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraphBuilder {
    config: ResolverConfig,
}

impl DependencyGraphBuilder {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Flatten `resolution` with the configured `[mediation] policy`.
    pub fn flatten(&self, resolution: &Resolution) -> FlattenResult {
        resolution.flatten(self.config.mediation.policy)
    }

    /// Build the tree of `root` with the strategies described by the
    /// configuration.
    pub fn resolve<R: RepositoryReader>(
        &self,
        root: &Dependency,
        reader: &R,
    ) -> Result<Resolution, ResolutionFailure> {
        self.build_tree(
            root,
            &ScopeTraverser::from_config(&self.config),
            &ClassicManager::default(),
            &StandardFilter::from_config(&self.config),
            reader,
        )
    }

    /// Build the full dependency tree of `root`.
    pub fn build_tree<R, T, M, F>(
        &self,
        root: &Dependency,
        traverser: &T,
        manager: &M,
        filter: &F,
        reader: &R,
    ) -> Result<Resolution, ResolutionFailure>
    where
        R: RepositoryReader,
        T: DependencyTraverser,
        M: DependencyManager,
        F: DependencyFilter,
    {
        tracing::debug!("Resolving dependency tree of {root}");
        let collector = ProblemCollector::new();
        let expansion = self.expand(root, traverser, manager, filter, reader, &collector);
        let problems = collector.into_problems();

        match expansion {
            Ok(tree) => {
                tracing::info!(
                    "Resolved {} node(s) below {root} with {} problem(s)",
                    tree.len() - 1,
                    problems.len()
                );
                Ok(Resolution { tree, problems })
            }
            Err((error, partial)) => Err(ResolutionFailure {
                error,
                problems,
                partial,
            }),
        }
    }

    fn expand<R, T, M, F>(
        &self,
        root: &Dependency,
        traverser: &T,
        manager: &M,
        filter: &F,
        reader: &R,
        collector: &ProblemCollector,
    ) -> Expansion
    where
        R: RepositoryReader,
        T: DependencyTraverser,
        M: DependencyManager,
        F: DependencyFilter,
    {
        let models = EffectiveModelBuilder::new(collector, ManagementRequest::from(&self.config));
        let root_node = self.resolve_root(root, reader, &models, collector)?;

        let path = if root_node.is_resolved() {
            CycleGuard::starting_at(&root_node.coordinate().gav())
        } else {
            CycleGuard::new()
        };
        let mut tree = DependencyTree::new(root_node);
        let mut stack = vec![Frame {
            node: tree.root(),
            traverser: traverser.clone(),
            manager: manager.clone(),
            filter: filter.clone(),
            reader: reader.clone(),
            path,
        }];

        while let Some(frame) = stack.pop() {
            let node = tree.node(frame.node).clone();
            let Some(model) = node.model.clone() else {
                continue;
            };
            if node.depth > 0 && !ScopeResolver::should_descend(node.scope()) {
                continue;
            }
            if !frame.traverser.accept(&node) {
                continue;
            }
            if node.depth >= self.config.traversal.max_depth {
                collector.report(
                    ProblemKind::DepthLimit,
                    format!(
                        "Maximum depth {} reached at {}, its dependencies are not expanded",
                        self.config.traversal.max_depth,
                        node.coordinate()
                    ),
                );
                continue;
            }

            let traverser = frame.traverser.derive_child(&node);
            let manager = frame.manager.derive_child(&node);
            let filter = frame.filter.derive_child(&node);
            let reader = if model.descriptor.repositories.is_empty() {
                frame.reader.clone()
            } else {
                frame
                    .reader
                    .with_additional_repositories(&model.descriptor.repositories)
            };
            let loader = models.loader(&reader);
            let relocations = RelocationResolver::new(&loader, collector);
            let inherited = (node.depth > 0).then(|| node.scope());
            let mut expand = Vec::new();

            for declared in &model.descriptor.dependencies {
                let mut dependency = declared.clone();
                manager.manage(&node, &mut dependency);
                if !filter.accept(&node, &dependency) {
                    tracing::trace!("{}: filtered out {dependency}", node.coordinate());
                    continue;
                }
                let Some(scope) = ScopeResolver::effective_scope(dependency.scope_or_default(), inherited)
                else {
                    continue;
                };
                dependency.scope = Some(scope);

                let Some(version) = dependency.version.clone() else {
                    let key = dependency.management_key().to_string();
                    collector.report(
                        ProblemKind::MissingManagedVersion,
                        format!(
                            "'dependencies.dependency.version' for {key} is missing in {}",
                            node.coordinate()
                        ),
                    );
                    return Err((PomdepError::MissingManagedVersion { dependency: key }, Some(tree)));
                };

                if scope == Scope::System {
                    tree.add_child(frame.node, GraphNode::new(dependency));
                    continue;
                }

                let constraint = match VersionConstraint::parse(&version) {
                    Ok(constraint) => constraint,
                    Err(message) => {
                        collector.report(
                            ProblemKind::MissingVersion,
                            format!("Invalid version of {}: {message}", dependency.ga()),
                        );
                        continue;
                    }
                };
                let versions = match VersionMediator::resolve_versions(
                    &reader,
                    &dependency.group_id,
                    &dependency.artifact_id,
                    &constraint,
                ) {
                    Ok(versions) => versions,
                    Err(e) => {
                        collector.report_with_cause(
                            ProblemKind::MissingVersion,
                            format!("Failed to list versions of {}", dependency.ga()),
                            e,
                        );
                        continue;
                    }
                };
                if versions.is_empty() {
                    collector.report(
                        ProblemKind::MissingVersion,
                        format!(
                            "No versions available for {}:{constraint} within specified range",
                            dependency.ga()
                        ),
                    );
                    continue;
                }

                for version in &versions.versions {
                    let candidate = dependency.with_coordinate(&dependency.coordinate_with_version(version));
                    let accept: &dyn Fn(&Coordinate) -> bool =
                        &|target: &Coordinate| filter.accept(&node, &candidate.with_coordinate(target));
                    let outcome = match relocations.resolve(
                        &candidate.coordinate_with_version(version),
                        versions.repository_for(version),
                        Some(accept),
                    ) {
                        Ok(outcome) => outcome,
                        Err(e) => return Err((into_pomdep_error(e), Some(tree))),
                    };

                    let (terminal, hops, child_model) = match outcome {
                        RelocationOutcome::Excluded { coordinate, .. } => {
                            tracing::debug!("{}: relocated {candidate} is excluded as {coordinate}", node.coordinate());
                            continue;
                        }
                        RelocationOutcome::Resolved {
                            coordinate,
                            relocations,
                            model,
                        } => (coordinate, relocations, model),
                    };

                    let gav = terminal.gav();
                    let child = GraphNode::new(candidate.with_coordinate(&terminal))
                        .with_model(child_model)
                        .with_relocations(hops);
                    let idx = tree.add_child(frame.node, child);
                    if frame.path.contains(&gav) {
                        collector.report(
                            ProblemKind::DependencyCycle,
                            format!("Dependency cycle: {} -> {gav}", frame.path),
                        );
                        continue;
                    }
                    expand.push((idx, gav));
                }
            }

            // Reversed so the first declared child is expanded first.
            for (idx, gav) in expand.into_iter().rev() {
                let mut path = frame.path.fork();
                if path.enter(&gav).is_err() {
                    continue;
                }
                stack.push(Frame {
                    node: idx,
                    traverser: traverser.clone(),
                    manager: manager.clone(),
                    filter: filter.clone(),
                    reader: reader.clone(),
                    path,
                });
            }
        }

        Ok(tree)
    }

    /// Pick the root version, follow its relocations and load its model.
    fn resolve_root<R: RepositoryReader>(
        &self,
        root: &Dependency,
        reader: &R,
        models: &EffectiveModelBuilder<'_>,
        collector: &ProblemCollector,
    ) -> Result<GraphNode, (PomdepError, Option<DependencyTree>)> {
        let unresolved = || GraphNode::new(root.clone());

        let Some(version) = root.version.as_deref() else {
            let key = root.management_key().to_string();
            collector.report(
                ProblemKind::MissingManagedVersion,
                format!("'dependencies.dependency.version' for {key} is missing"),
            );
            return Err((PomdepError::MissingManagedVersion { dependency: key }, None));
        };

        let version = match VersionConstraint::parse(version) {
            Ok(constraint) if constraint.is_range() => {
                let highest = VersionMediator::resolve_versions(
                    reader,
                    &root.group_id,
                    &root.artifact_id,
                    &constraint,
                )
                .map_err(|e| (into_pomdep_error(e), None))?
                .highest()
                .map(str::to_string);
                match highest {
                    Some(v) => v,
                    None => {
                        collector.report(
                            ProblemKind::MissingVersion,
                            format!("No versions available for {}:{constraint} within specified range", root.ga()),
                        );
                        return Ok(unresolved());
                    }
                }
            }
            Ok(_) => version.to_string(),
            Err(message) => {
                collector.report(
                    ProblemKind::MissingVersion,
                    format!("Invalid version of {}: {message}", root.ga()),
                );
                return Ok(unresolved());
            }
        };

        let loader = models.loader(reader);
        let outcome = RelocationResolver::new(&loader, collector)
            .resolve(&root.coordinate_with_version(&version), None, None)
            .map_err(|e| (into_pomdep_error(e), Some(DependencyTree::new(unresolved()))))?;

        let node = match outcome {
            RelocationOutcome::Resolved {
                coordinate,
                relocations,
                model,
            } => GraphNode::new(root.with_coordinate(&coordinate))
                .with_model(model)
                .with_relocations(relocations),
            RelocationOutcome::Excluded {
                coordinate,
                relocations,
            } => GraphNode::new(root.with_coordinate(&coordinate)).with_relocations(relocations),
        };
        Ok(node)
    }
}

fn into_pomdep_error(report: miette::Report) -> PomdepError {
    report
        .downcast::<PomdepError>()
        .unwrap_or_else(|report| PomdepError::Resolution {
            message: report.to_string(),
        })
}
