//! In-memory repositories, for embedding and tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use pomdep_core::coordinate::Coordinate;
use pomdep_core::descriptor::ModuleDescriptor;
use pomdep_core::repository::RemoteRepository;
use pomdep_util::errors::PomdepResult;

use crate::reader::{DescribedModule, ListedVersion, RepositoryReader};
use crate::version::{MavenVersion, VersionConstraint};

/// A set of named in-memory repositories, some of which are active.
///
/// Repositories that are registered but not active only become visible once
/// a descriptor declares them (by ID) in its `<repositories>`.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    modules: Arc<BTreeMap<String, Vec<ModuleDescriptor>>>,
    active: Vec<String>,
}

impl MemoryRepository {
    /// An empty reader with one active repository.
    pub fn new(repository_id: &str) -> Self {
        let mut modules = BTreeMap::new();
        modules.insert(repository_id.to_string(), Vec::new());
        Self {
            modules: Arc::new(modules),
            active: vec![repository_id.to_string()],
        }
    }

    /// Add a descriptor to the first active repository.
    pub fn add(&mut self, descriptor: ModuleDescriptor) -> &mut Self {
        let id = self.active.first().cloned().unwrap_or_default();
        self.add_to(&id, descriptor)
    }

    /// Add a descriptor to `repository_id`, registering it if needed.
    ///
    /// Newly registered repositories start out inactive.
    pub fn add_to(&mut self, repository_id: &str, descriptor: ModuleDescriptor) -> &mut Self {
        Arc::make_mut(&mut self.modules)
            .entry(repository_id.to_string())
            .or_default()
            .push(descriptor);
        self
    }

    pub fn active_repositories(&self) -> &[String] {
        &self.active
    }

    fn search_order<'a>(&'a self, preferred: Option<&'a str>) -> Vec<&'a str> {
        let mut order: Vec<&str> = Vec::with_capacity(self.active.len());
        if let Some(p) = preferred.filter(|p| self.active.iter().any(|a| a == p)) {
            order.push(p);
        }
        for id in &self.active {
            if Some(id.as_str()) != preferred {
                order.push(id);
            }
        }
        order
    }

    fn modules_in(&self, repository_id: &str) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules
            .get(repository_id)
            .into_iter()
            .flat_map(|m| m.iter())
    }
}

fn is_module(descriptor: &ModuleDescriptor, group_id: &str, artifact_id: &str) -> bool {
    descriptor.artifact_id == artifact_id && descriptor.effective_group_id() == Some(group_id)
}

impl RepositoryReader for MemoryRepository {
    fn list_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        constraint: &VersionConstraint,
    ) -> PomdepResult<Vec<ListedVersion>> {
        let mut listed = Vec::new();
        for id in &self.active {
            for descriptor in self.modules_in(id) {
                if !is_module(descriptor, group_id, artifact_id) {
                    continue;
                }
                let Some(version) = descriptor.effective_version() else {
                    continue;
                };
                if constraint.contains(&MavenVersion::parse(version)) {
                    listed.push(ListedVersion {
                        version: version.to_string(),
                        repository_id: id.clone(),
                    });
                }
            }
        }
        Ok(listed)
    }

    fn describe(
        &self,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
    ) -> PomdepResult<Option<DescribedModule>> {
        for id in self.search_order(preferred_repository) {
            let found = self.modules_in(id).find(|d| {
                is_module(d, &coordinate.group_id, &coordinate.artifact_id)
                    && d.effective_version() == Some(coordinate.version.as_str())
            });
            if let Some(descriptor) = found {
                return Ok(Some(DescribedModule {
                    descriptor: descriptor.clone(),
                    repository_id: id.to_string(),
                }));
            }
        }
        Ok(None)
    }

    fn with_additional_repositories(&self, repositories: &[RemoteRepository]) -> Self {
        let mut extended = self.clone();
        for repo in repositories {
            if !extended.active.contains(&repo.id) {
                extended.active.push(repo.id.clone());
            }
        }
        extended
    }

    fn repository_ids(&self) -> Vec<String> {
        self.active.clone()
    }
}
