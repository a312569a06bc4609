//! Repositories on the local filesystem in Maven directory layout.

use std::path::{Path, PathBuf};

use pomdep_core::config::ResolverConfig;
use pomdep_core::coordinate::Coordinate;
use pomdep_core::repository::RemoteRepository;
use pomdep_maven::layout;
use pomdep_maven::metadata::parse_versions;
use pomdep_maven::pom::parse_pom;
use pomdep_util::errors::{PomdepError, PomdepResult};
use pomdep_util::fs::{child_dirs, read_if_exists};

use crate::reader::{DescribedModule, ListedVersion, RepositoryReader};
use crate::version::{MavenVersion, VersionConstraint};

/// Reads descriptors from one or more Maven-layout directories.
#[derive(Debug, Clone, Default)]
pub struct LocalRepositoryReader {
    roots: Vec<(String, PathBuf)>,
}

impl LocalRepositoryReader {
    pub fn new(roots: Vec<(String, PathBuf)>) -> Self {
        Self { roots }
    }

    /// One root per `[repositories]` entry, in ID order.
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            config
                .repositories
                .iter()
                .map(|(id, dir)| (id.clone(), PathBuf::from(dir)))
                .collect(),
        )
    }

    pub fn roots(&self) -> &[(String, PathBuf)] {
        &self.roots
    }

    /// Versions present under one root: from `maven-metadata*.xml` when
    /// available, otherwise from version directories holding a POM.
    fn versions_in(&self, root: &Path, group_id: &str, artifact_id: &str) -> PomdepResult<Vec<String>> {
        let mut versions: Vec<String> = Vec::new();
        for file in layout::metadata_files(root, group_id, artifact_id) {
            let Some(xml) = read_if_exists(&file).map_err(PomdepError::from)? else {
                continue;
            };
            for v in parse_versions(&xml)? {
                if !versions.contains(&v) {
                    versions.push(v);
                }
            }
        }
        if !versions.is_empty() {
            return Ok(versions);
        }

        let dir = root.join(layout::artifact_path(group_id, artifact_id));
        for version_dir in child_dirs(&dir).map_err(PomdepError::from)? {
            let Some(name) = version_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if layout::pom_file(root, group_id, artifact_id, name).is_file() {
                versions.push(name.to_string());
            }
        }
        Ok(versions)
    }

    fn search_order<'a>(&'a self, preferred: Option<&str>) -> Vec<&'a (String, PathBuf)> {
        let (mut first, rest): (Vec<_>, Vec<_>) = self
            .roots
            .iter()
            .partition(|(id, _)| Some(id.as_str()) == preferred);
        first.extend(rest);
        first
    }
}

impl RepositoryReader for LocalRepositoryReader {
    fn list_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        constraint: &VersionConstraint,
    ) -> PomdepResult<Vec<ListedVersion>> {
        let mut listed = Vec::new();
        for (id, root) in &self.roots {
            for version in self.versions_in(root, group_id, artifact_id)? {
                if constraint.contains(&MavenVersion::parse(&version)) {
                    listed.push(ListedVersion {
                        version,
                        repository_id: id.clone(),
                    });
                }
            }
        }
        tracing::trace!(
            "{group_id}:{artifact_id} {constraint}: {} candidate(s)",
            listed.len()
        );
        Ok(listed)
    }

    fn describe(
        &self,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
    ) -> PomdepResult<Option<DescribedModule>> {
        for (id, root) in self.search_order(preferred_repository) {
            let path = layout::pom_file(
                root,
                &coordinate.group_id,
                &coordinate.artifact_id,
                &coordinate.version,
            );
            let Some(xml) = read_if_exists(&path).map_err(PomdepError::from)? else {
                continue;
            };
            let descriptor = parse_pom(&xml)
                .map_err(|e| e.wrap_err(format!("Failed to read {}", path.display())))?;
            return Ok(Some(DescribedModule {
                descriptor,
                repository_id: id.clone(),
            }));
        }
        Ok(None)
    }

    fn with_additional_repositories(&self, repositories: &[RemoteRepository]) -> Self {
        let mut extended = self.clone();
        for repo in repositories {
            if extended.roots.iter().any(|(id, _)| *id == repo.id) {
                continue;
            }
            match repo.local_path() {
                Some(path) => extended.roots.push((repo.id.clone(), path)),
                None => tracing::debug!("Ignoring non-local repository '{}' ({})", repo.id, repo.url),
            }
        }
        extended
    }

    fn repository_ids(&self) -> Vec<String> {
        self.roots.iter().map(|(id, _)| id.clone()).collect()
    }
}
