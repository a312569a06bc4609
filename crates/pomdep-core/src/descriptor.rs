//! Module descriptors: declared dependencies, management, parent, relocation.

use std::collections::BTreeMap;

use crate::coordinate::Coordinate;
use crate::dependency::Dependency;
use crate::repository::RemoteRepository;
use crate::DEFAULT_TYPE;

/// Maximum passes over a string when expanding nested `${...}` references.
const MAX_INTERPOLATION_PASSES: usize = 20;

/// A parsed module descriptor, before or after parent inheritance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: String,
    pub version: Option<String>,
    pub packaging: Option<String>,

    pub parent: Option<Coordinate>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Dependency>,
    pub dependency_management: Vec<Dependency>,
    pub relocation: Option<Relocation>,
    pub repositories: Vec<RemoteRepository>,
}

/// A "moved to" pointer. Unset fields keep the value of the relocated module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relocation {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub message: Option<String>,
}

impl Relocation {
    /// Apply this relocation to `from`, keeping type and classifier.
    pub fn apply(&self, from: &Coordinate) -> Coordinate {
        Coordinate {
            group_id: self.group_id.clone().unwrap_or_else(|| from.group_id.clone()),
            artifact_id: self
                .artifact_id
                .clone()
                .unwrap_or_else(|| from.artifact_id.clone()),
            version: self.version.clone().unwrap_or_else(|| from.version.clone()),
            type_: from.type_.clone(),
            classifier: from.classifier.clone(),
        }
    }
}

impl ModuleDescriptor {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// The module's own coordinate, when group and version are known.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(
            self.effective_group_id()?,
            &self.artifact_id,
            self.effective_version()?,
        );
        Some(match self.packaging.as_deref() {
            Some(p) if p != DEFAULT_TYPE => coordinate.with_type(p),
            _ => coordinate,
        })
    }

    /// `group:artifact:version`, or the bare artifact ID if incomplete.
    pub fn module_id(&self) -> String {
        match (self.effective_group_id(), self.effective_version()) {
            (Some(g), Some(v)) => format!("{g}:{}:{v}", self.artifact_id),
            _ => self.artifact_id.clone(),
        }
    }

    /// Management entries that import a bill of materials.
    pub fn bom_imports(&self) -> impl Iterator<Item = &Dependency> {
        self.dependency_management
            .iter()
            .filter(|d| d.is_bom_import())
    }

    /// Resolve `${property}` references using descriptor properties and
    /// built-in project variables. Unknown references are left verbatim.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut passes = 0;
        while result.contains("${") && passes < MAX_INTERPOLATION_PASSES {
            passes += 1;
            let mut out = String::with_capacity(result.len());
            let mut rest = result.as_str();
            while let Some(start) = rest.find("${") {
                let Some(end) = rest[start..].find('}') else {
                    break;
                };
                let key = &rest[start + 2..start + end];
                out.push_str(&rest[..start]);
                match self.resolve_property(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + end + 1]),
                }
                rest = &rest[start + end + 1..];
            }
            out.push_str(rest);
            if out == result {
                break;
            }
            result = out;
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        let key = key
            .strip_prefix("pom.")
            .map(|k| format!("project.{k}"))
            .unwrap_or_else(|| key.to_string());
        match key.as_str() {
            "project.groupId" => self.effective_group_id().map(str::to_string),
            "project.artifactId" => Some(self.artifact_id.clone()),
            "project.version" => self.effective_version().map(str::to_string),
            "project.packaging" => self.packaging.clone(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.artifactId" => self.parent.as_ref().map(|p| p.artifact_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(&key).cloned(),
        }
    }

    /// Interpolate property references in dependencies, management entries
    /// and the relocation target.
    pub fn resolve_properties(&mut self) {
        let snapshot = self.clone();
        let interpolate_dep = |dep: &mut Dependency| {
            dep.group_id = snapshot.interpolate(&dep.group_id);
            dep.artifact_id = snapshot.interpolate(&dep.artifact_id);
            dep.version = dep.version.as_deref().map(|v| snapshot.interpolate(v));
            dep.classifier = dep.classifier.as_deref().map(|c| snapshot.interpolate(c));
            dep.system_path = dep
                .system_path
                .as_ref()
                .map(|p| snapshot.interpolate(&p.to_string_lossy()).into());
        };
        self.dependencies.iter_mut().for_each(interpolate_dep);
        self.dependency_management
            .iter_mut()
            .for_each(interpolate_dep);
        if let Some(relocation) = &mut self.relocation {
            relocation.group_id = relocation.group_id.as_deref().map(|s| snapshot.interpolate(s));
            relocation.artifact_id = relocation
                .artifact_id
                .as_deref()
                .map(|s| snapshot.interpolate(s));
            relocation.version = relocation.version.as_deref().map(|s| snapshot.interpolate(s));
        }
    }

    /// Inherit from a parent descriptor whose own ancestry is already merged.
    ///
    /// Nothing is interpolated here: call [`resolve_properties`] afterwards so
    /// inherited `${...}` references see this module's properties. Child values
    /// win. Inherited dependencies and managed entries are appended after the
    /// child's own, and only for keys the child does not declare.
    ///
    /// [`resolve_properties`]: ModuleDescriptor::resolve_properties
    pub fn apply_parent(&mut self, parent: &ModuleDescriptor) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(str::to_string);
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(str::to_string);
        }
        for dep in &parent.dependencies {
            let key = dep.management_key();
            if !self.dependencies.iter().any(|d| d.management_key() == key) {
                self.dependencies.push(dep.clone());
            }
        }
        for managed in &parent.dependency_management {
            let key = managed.management_key();
            if !self
                .dependency_management
                .iter()
                .any(|d| d.management_key() == key)
            {
                self.dependency_management.push(managed.clone());
            }
        }
        for repo in &parent.repositories {
            if !self.repositories.iter().any(|r| r.id == repo.id) {
                self.repositories.push(repo.clone());
            }
        }
    }
}
