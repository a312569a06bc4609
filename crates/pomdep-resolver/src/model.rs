//! Effective models: descriptors with their parent chain applied, properties
//! interpolated and dependency management (including BOM imports) merged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use pomdep_core::coordinate::Coordinate;
use pomdep_core::descriptor::ModuleDescriptor;
use pomdep_core::problem::{ProblemCollector, ProblemKind};
use pomdep_util::errors::{PomdepError, PomdepResult};

use crate::cycle::CycleGuard;
use crate::management::{DependencyManagementMerger, ManagementGraph, ManagementRequest, ManagementTable};
use crate::reader::{ModelLoader, RepositoryReader};

/// A module ready for dependency traversal.
#[derive(Debug, Clone)]
pub struct EffectiveModel {
    /// The coordinate the model was requested under.
    pub coordinate: Coordinate,
    /// The descriptor with its ancestry merged but nothing interpolated.
    /// Children inherit from this, never from [`descriptor`](Self::descriptor).
    pub raw: ModuleDescriptor,
    pub descriptor: ModuleDescriptor,
    pub management: ManagementTable,
    pub repository_id: String,
}

/// Builds and caches [`EffectiveModel`]s for one resolution request.
///
/// Models are cached per coordinate and repository set: a subtree that
/// declares extra repositories never shares models with its siblings.
pub struct EffectiveModelBuilder<'c> {
    collector: &'c ProblemCollector,
    request: ManagementRequest,
    cache: Mutex<HashMap<String, Arc<EffectiveModel>>>,
    graph: Mutex<ManagementGraph>,
}

impl<'c> EffectiveModelBuilder<'c> {
    pub fn new(collector: &'c ProblemCollector, request: ManagementRequest) -> Self {
        Self {
            collector,
            request,
            cache: Mutex::new(HashMap::new()),
            graph: Mutex::new(ManagementGraph::new()),
        }
    }

    /// The inheritance/import graph of every model built so far.
    pub fn management_graph(&self) -> ManagementGraph {
        lock(&self.graph).clone()
    }

    /// A [`ModelLoader`] that builds models from `reader`.
    pub fn loader<'a, R: RepositoryReader>(&'a self, reader: &'a R) -> ReaderModelLoader<'a, 'c, R> {
        ReaderModelLoader { builder: self, reader }
    }

    /// Build the effective model of `coordinate`.
    ///
    /// A parent chain that revisits a module is fatal and returns `Err`.
    /// Missing or unreadable descriptors are reported and yield `Ok(None)`.
    pub fn build<R: RepositoryReader>(
        &self,
        reader: &R,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
    ) -> PomdepResult<Option<Arc<EffectiveModel>>> {
        let mut parents = CycleGuard::new();
        let mut imports = CycleGuard::new();
        self.build_guarded(reader, coordinate, preferred_repository, &mut parents, &mut imports)
    }

    fn build_guarded<R: RepositoryReader>(
        &self,
        reader: &R,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
        parents: &mut CycleGuard,
        imports: &mut CycleGuard,
    ) -> PomdepResult<Option<Arc<EffectiveModel>>> {
        let key = coordinate.gav();
        let cache_key = format!("{key}@{}", reader.repository_ids().join(","));
        if let Some(cached) = lock(&self.cache).get(&cache_key) {
            return Ok(Some(Arc::clone(cached)));
        }

        if let Err(cycle) = parents.enter(&key) {
            self.collector.report(
                ProblemKind::AncestryCycle,
                format!("The parents form a cycle: {cycle}"),
            );
            return Err(PomdepError::AncestryCycle {
                chain: cycle.to_string(),
            }
            .into());
        }
        let result = self.assemble(reader, coordinate, preferred_repository, parents, imports);
        parents.leave(&key);

        let model = result?;
        if let Some(model) = &model {
            lock(&self.cache).insert(cache_key, Arc::clone(model));
        }
        Ok(model)
    }

    fn assemble<R: RepositoryReader>(
        &self,
        reader: &R,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
        parents: &mut CycleGuard,
        imports: &mut CycleGuard,
    ) -> PomdepResult<Option<Arc<EffectiveModel>>> {
        let described = match reader.describe(coordinate, preferred_repository) {
            Ok(Some(described)) => described,
            Ok(None) => {
                self.collector.report(
                    ProblemKind::MissingDescriptor,
                    format!("The POM for {coordinate} is missing, no dependency information available"),
                );
                return Ok(None);
            }
            Err(e) => {
                self.collector.report_with_cause(
                    ProblemKind::InvalidDescriptor,
                    format!("The POM for {coordinate} is invalid, transitive dependencies will not be available"),
                    e,
                );
                return Ok(None);
            }
        };

        let module_id = coordinate.gav();
        let mut raw = described.descriptor;
        let own_managed = raw.dependency_management.len();

        let mut parent_model = None;
        if let Some(parent) = raw.parent.clone() {
            match self.build_guarded(reader, &parent, None, parents, imports)? {
                Some(model) => {
                    raw.apply_parent(&model.raw);
                    parent_model = Some(model);
                }
                None => self.collector.report(
                    ProblemKind::UnresolvableParent,
                    format!("Non-resolvable parent POM {parent} for {coordinate}"),
                ),
            }
        }
        let mut descriptor = raw.clone();
        descriptor.resolve_properties();

        let (own, inherited) = descriptor.dependency_management.split_at(own_managed);
        let mut management = ManagementTable::from_declared(&module_id, own);
        {
            let mut graph = lock(&self.graph);
            graph.declare(&module_id, management.keys());
            if let Some(parent) = &parent_model {
                graph.add_edge(&module_id, &parent.coordinate.gav());
            }
        }
        if let Some(parent) = &parent_model {
            management.inherit(&parent.management, inherited);
        }

        let sources = self.import_sources(reader, &module_id, &descriptor, imports)?;
        if !sources.is_empty() {
            let graph = lock(&self.graph);
            DependencyManagementMerger::import_management(
                &mut management,
                &sources,
                &graph,
                Some(&self.request),
            );
        }

        tracing::trace!(
            "effective model {module_id}: {} dependencies, {} managed",
            descriptor.dependencies.len(),
            management.len()
        );
        Ok(Some(Arc::new(EffectiveModel {
            coordinate: coordinate.clone(),
            raw,
            descriptor,
            management,
            repository_id: described.repository_id,
        })))
    }

    /// Load the management tables of every BOM `descriptor` imports,
    /// applying each import's exclusions.
    fn import_sources<R: RepositoryReader>(
        &self,
        reader: &R,
        module_id: &str,
        descriptor: &ModuleDescriptor,
        imports: &mut CycleGuard,
    ) -> PomdepResult<Vec<ManagementTable>> {
        let boms: Vec<_> = descriptor.bom_imports().cloned().collect();
        if boms.is_empty() {
            return Ok(Vec::new());
        }
        if let Err(cycle) = imports.enter(module_id) {
            self.collector.report(
                ProblemKind::ImportCycle,
                format!("The dependencies of type=pom and with scope=import form a cycle: {cycle}"),
            );
            return Ok(Vec::new());
        }

        let mut sources = Vec::new();
        for bom in boms {
            let Some(version) = bom.version.as_deref() else {
                self.collector.report(
                    ProblemKind::UnresolvableImport,
                    format!(
                        "'dependencyManagement.dependencies.dependency.version' for {} is missing",
                        bom.management_key()
                    ),
                );
                continue;
            };
            let coordinate = bom.coordinate_with_version(version);
            let import_id = coordinate.gav();
            if imports.contains(&import_id) {
                self.collector.report(
                    ProblemKind::ImportCycle,
                    format!(
                        "The dependencies of type=pom and with scope=import form a cycle: {imports} -> {import_id}"
                    ),
                );
                continue;
            }

            let imported = self.build_guarded(reader, &coordinate, None, &mut CycleGuard::new(), imports)?;
            let Some(imported) = imported else {
                self.collector.report(
                    ProblemKind::UnresolvableImport,
                    format!("Non-resolvable import POM {coordinate} for {module_id}"),
                );
                continue;
            };
            lock(&self.graph).add_edge(module_id, &import_id);
            sources.push(if bom.exclusions.is_empty() {
                imported.management.clone()
            } else {
                imported.management.without_excluded(&bom.exclusions)
            });
        }

        imports.leave(module_id);
        Ok(sources)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`ModelLoader`] over a [`RepositoryReader`], backed by a shared builder.
pub struct ReaderModelLoader<'a, 'c, R> {
    builder: &'a EffectiveModelBuilder<'c>,
    reader: &'a R,
}

impl<R: RepositoryReader> ModelLoader for ReaderModelLoader<'_, '_, R> {
    fn load(
        &self,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
    ) -> PomdepResult<Option<Arc<EffectiveModel>>> {
        self.builder.build(self.reader, coordinate, preferred_repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRepository;
    use pomdep_core::coordinate::ManagementKey;
    use pomdep_core::dependency::Dependency;
    use pomdep_core::scope::Scope;

    fn module(g: &str, a: &str, v: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            group_id: Some(g.into()),
            artifact_id: a.into(),
            version: Some(v.into()),
            ..Default::default()
        }
    }

    fn bom_import(g: &str, a: &str, v: &str) -> Dependency {
        Dependency::new(g, a, Some(v)).with_type("pom").with_scope(Scope::Import)
    }

    fn request() -> ManagementRequest {
        ManagementRequest { nearest_match_enabled: true }
    }

    #[test]
    fn parent_properties_and_management_are_inherited() {
        let mut parent = module("org", "parent", "1");
        parent.packaging = Some("pom".into());
        parent.properties.insert("lib.version".into(), "4.2".into());
        parent
            .dependency_management
            .push(Dependency::new("org", "lib", Some("${lib.version}")));

        let mut child = module("org", "child", "1");
        child.parent = Some(Coordinate::new("org", "parent", "1").with_type("pom"));

        let mut repo = MemoryRepository::new("central");
        repo.add(parent).add(child);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let model = builder
            .build(&repo, &Coordinate::new("org", "child", "1"), None)
            .unwrap()
            .unwrap();
        let entry = model.management.get(&ManagementKey::new("org", "lib")).unwrap();
        assert_eq!(entry.dependency.version.as_deref(), Some("4.2"));
        assert_eq!(entry.depth, 1);
        assert!(collector.is_empty());
    }

    #[test]
    fn child_property_overrides_inherited_management() {
        let mut parent = module("org", "parent", "1");
        parent.packaging = Some("pom".into());
        parent.properties.insert("lib.version".into(), "1.0".into());
        parent
            .dependency_management
            .push(Dependency::new("org", "lib", Some("${lib.version}")));
        parent
            .dependencies
            .push(Dependency::new("org", "api", Some("${project.version}")));

        let mut child = module("org", "child", "3");
        child.parent = Some(Coordinate::new("org", "parent", "1").with_type("pom"));
        child.properties.insert("lib.version".into(), "2.0".into());

        let mut repo = MemoryRepository::new("central");
        repo.add(parent).add(child);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let model = builder
            .build(&repo, &Coordinate::new("org", "child", "3"), None)
            .unwrap()
            .unwrap();
        let entry = model.management.get(&ManagementKey::new("org", "lib")).unwrap();
        assert_eq!(entry.dependency.version.as_deref(), Some("2.0"));
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.source, "org:parent:1");
        assert_eq!(model.descriptor.dependencies[0].version.as_deref(), Some("3"));

        let parent = builder
            .build(&repo, &Coordinate::new("org", "parent", "1"), None)
            .unwrap()
            .unwrap();
        let own = parent.management.get(&ManagementKey::new("org", "lib")).unwrap();
        assert_eq!(own.dependency.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn grandparent_management_keeps_its_depth() {
        let mut grandparent = module("org", "grand", "1");
        grandparent
            .dependency_management
            .push(Dependency::new("org", "lib", Some("${lib.version}")));
        let mut parent = module("org", "parent", "1");
        parent.parent = Some(Coordinate::new("org", "grand", "1").with_type("pom"));
        parent.properties.insert("lib.version".into(), "1.5".into());
        let mut child = module("org", "child", "1");
        child.parent = Some(Coordinate::new("org", "parent", "1").with_type("pom"));

        let mut repo = MemoryRepository::new("central");
        repo.add(grandparent).add(parent).add(child);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let model = builder
            .build(&repo, &Coordinate::new("org", "child", "1"), None)
            .unwrap()
            .unwrap();
        let entry = model.management.get(&ManagementKey::new("org", "lib")).unwrap();
        assert_eq!(entry.dependency.version.as_deref(), Some("1.5"));
        assert_eq!(entry.depth, 2);
        assert_eq!(entry.source, "org:grand:1");
    }

    #[test]
    fn parent_cycle_is_fatal() {
        let mut a = module("org", "a", "1");
        a.parent = Some(Coordinate::new("org", "b", "1").with_type("pom"));
        let mut b = module("org", "b", "1");
        b.parent = Some(Coordinate::new("org", "a", "1").with_type("pom"));
        let mut repo = MemoryRepository::new("central");
        repo.add(a).add(b);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let err = builder
            .build(&repo, &Coordinate::new("org", "a", "1"), None)
            .unwrap_err();
        assert!(err.to_string().contains("The parents form a cycle"), "got: {err}");
        assert_eq!(collector.count(ProblemKind::AncestryCycle), 1);
    }

    #[test]
    fn missing_parent_is_reported_and_model_still_built() {
        let mut child = module("org", "child", "1");
        child.parent = Some(Coordinate::new("org", "gone", "1").with_type("pom"));
        let mut repo = MemoryRepository::new("central");
        repo.add(child);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let model = builder
            .build(&repo, &Coordinate::new("org", "child", "1"), None)
            .unwrap();
        assert!(model.is_some());
        assert_eq!(collector.count(ProblemKind::UnresolvableParent), 1);
        assert_eq!(collector.count(ProblemKind::MissingDescriptor), 1);
    }

    #[test]
    fn bom_import_with_exclusions() {
        let mut bom = module("org", "bom", "1");
        bom.dependency_management.push(Dependency::new("org", "kept", Some("1.0")));
        bom.dependency_management.push(Dependency::new("org", "dropped", Some("1.0")));

        let mut app = module("org", "app", "1");
        let mut import = bom_import("org", "bom", "1");
        import.exclusions.push(pomdep_core::dependency::Exclusion::new("org", "dropped"));
        app.dependency_management.push(import);

        let mut repo = MemoryRepository::new("central");
        repo.add(bom).add(app);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let model = builder
            .build(&repo, &Coordinate::new("org", "app", "1"), None)
            .unwrap()
            .unwrap();
        assert!(model.management.get(&ManagementKey::new("org", "dropped")).is_none());
        let kept = model.management.get(&ManagementKey::new("org", "kept")).unwrap();
        assert_eq!(kept.depth, 1);
        assert_eq!(kept.dependency.exclusions.len(), 1);
    }

    #[test]
    fn import_cycle_is_reported_once_per_edge() {
        let mut x = module("org", "x", "1");
        x.dependency_management.push(bom_import("org", "y", "1"));
        let mut y = module("org", "y", "1");
        y.dependency_management.push(bom_import("org", "x", "1"));
        y.dependency_management.push(Dependency::new("org", "k", Some("2.0")));
        let mut repo = MemoryRepository::new("central");
        repo.add(x).add(y);

        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let model = builder
            .build(&repo, &Coordinate::new("org", "x", "1"), None)
            .unwrap()
            .unwrap();
        assert_eq!(collector.count(ProblemKind::ImportCycle), 1);
        assert!(model.management.get(&ManagementKey::new("org", "k")).is_some());
    }

    #[test]
    fn models_are_cached() {
        let mut repo = MemoryRepository::new("central");
        repo.add(module("org", "a", "1"));
        let collector = ProblemCollector::new();
        let builder = EffectiveModelBuilder::new(&collector, request());
        let coord = Coordinate::new("org", "a", "1");
        let first = builder.build(&repo, &coord, None).unwrap().unwrap();
        let second = builder.loader(&repo).load(&coord, None).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
