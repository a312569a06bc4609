//! Dependency-management tables and the merging of imported (BOM) tables.
//!
//! Every entry records how far from the owning module it was declared:
//! depth 0 is the module itself, each parent hop or import hop adds one.
//! When an imported key collides with an existing one, the merger keeps the
//! existing entry unless nearest matching is enabled and the imported
//! declaration is strictly closer. Entries the module declares itself
//! (direct, depth 0) are never replaced.

use std::collections::{HashMap, HashSet, VecDeque};

use pomdep_core::config::ResolverConfig;
use pomdep_core::coordinate::ManagementKey;
use pomdep_core::dependency::{Dependency, Exclusion};

/// How a management entry reached the table that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Declared by the owning module.
    Direct,
    /// Declared by a parent.
    Inherited,
    /// Brought in by a `scope=import` bill of materials.
    Imported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementEntry {
    pub dependency: Dependency,
    pub depth: usize,
    pub provenance: Provenance,
    /// ID of the module whose descriptor declares the entry.
    pub source: String,
}

/// Ordered management entries of one module, unique by [`ManagementKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagementTable {
    owner: String,
    entries: Vec<ManagementEntry>,
    index: HashMap<ManagementKey, usize>,
}

impl ManagementTable {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            ..Default::default()
        }
    }

    /// A table of the entries `owner` declares itself. BOM imports are skipped.
    pub fn from_declared<'a>(owner: &str, declared: impl IntoIterator<Item = &'a Dependency>) -> Self {
        let mut table = Self::new(owner);
        for dependency in declared {
            if dependency.is_bom_import() {
                continue;
            }
            if table.get(&dependency.management_key()).is_some() {
                tracing::warn!(
                    "{owner}: duplicate management entry for {}, keeping the first",
                    dependency.management_key()
                );
                continue;
            }
            table.insert(ManagementEntry {
                dependency: dependency.clone(),
                depth: 0,
                provenance: Provenance::Direct,
                source: owner.to_string(),
            });
        }
        table
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn get(&self, key: &ManagementKey) -> Option<&ManagementEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// The entry managing `dependency`, if any.
    pub fn managed(&self, dependency: &Dependency) -> Option<&ManagementEntry> {
        self.get(&dependency.management_key())
    }

    /// Insert `entry`, replacing any entry with the same key in place.
    pub fn insert(&mut self, entry: ManagementEntry) {
        let key = entry.dependency.management_key();
        match self.index.get(&key) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Add inherited entries for keys this table does not declare.
    ///
    /// `restated` holds the ancestry's managed dependencies interpolated in
    /// this module's context. Depth and source follow the parent's entry for
    /// the same key.
    pub fn inherit<'a>(
        &mut self,
        parent: &ManagementTable,
        restated: impl IntoIterator<Item = &'a Dependency>,
    ) {
        for dependency in restated {
            if dependency.is_bom_import() {
                continue;
            }
            let key = dependency.management_key();
            if self.get(&key).is_some() {
                continue;
            }
            let (depth, source) = match parent.get(&key) {
                Some(entry) => (entry.depth, entry.source.clone()),
                None => (0, parent.owner.clone()),
            };
            self.insert(ManagementEntry {
                dependency: dependency.clone(),
                depth: depth + 1,
                provenance: Provenance::Inherited,
                source,
            });
        }
    }

    /// Drop entries matched by `exclusions` and add the exclusions to
    /// every surviving entry.
    pub fn without_excluded(&self, exclusions: &[Exclusion]) -> Self {
        let mut filtered = Self::new(&self.owner);
        for entry in &self.entries {
            let dep = &entry.dependency;
            if exclusions.iter().any(|e| e.matches(&dep.group_id, &dep.artifact_id)) {
                continue;
            }
            let mut entry = entry.clone();
            for exclusion in exclusions {
                if !entry.dependency.exclusions.contains(exclusion) {
                    entry.dependency.exclusions.push(exclusion.clone());
                }
            }
            filtered.insert(entry);
        }
        filtered
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManagementEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ManagementKey> {
        self.index.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Which modules declare which management keys, and which modules each
/// module inherits from or imports.
#[derive(Debug, Clone, Default)]
pub struct ManagementGraph {
    declared: HashMap<String, HashSet<ManagementKey>>,
    edges: HashMap<String, Vec<String>>,
}

impl ManagementGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare<'a>(&mut self, module: &str, keys: impl IntoIterator<Item = &'a ManagementKey>) {
        self.declared
            .entry(module.to_string())
            .or_default()
            .extend(keys.into_iter().cloned());
    }

    /// Record that `from` inherits from or imports `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let targets = self.edges.entry(from.to_string()).or_default();
        if !targets.iter().any(|t| t == to) {
            targets.push(to.to_string());
        }
    }

    /// Number of hops from `module` to the closest module declaring `key`.
    pub fn find_declared_dependency_depth(&self, module: &str, key: &ManagementKey) -> Option<usize> {
        let mut queue = VecDeque::from([(module, 0usize)]);
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some((current, depth)) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if self.declared.get(current).is_some_and(|keys| keys.contains(key)) {
                return Some(depth);
            }
            for next in self.edges.get(current).into_iter().flatten() {
                queue.push_back((next.as_str(), depth + 1));
            }
        }
        None
    }
}

/// Options for one management merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagementRequest {
    pub nearest_match_enabled: bool,
}

impl From<&ResolverConfig> for ManagementRequest {
    fn from(config: &ResolverConfig) -> Self {
        Self {
            nearest_match_enabled: config.management.nearest_match,
        }
    }
}

pub struct DependencyManagementMerger;

impl DependencyManagementMerger {
    /// Merge the imported `sources`, in order, into `target`.
    ///
    /// Without a request, nearest matching is disabled and the first
    /// source to supply a key wins. Merging the same sources twice is a no-op.
    pub fn import_management(
        target: &mut ManagementTable,
        sources: &[ManagementTable],
        graph: &ManagementGraph,
        request: Option<&ManagementRequest>,
    ) {
        let nearest = request.is_some_and(|r| r.nearest_match_enabled);

        for source in sources {
            for entry in source.entries() {
                let key = entry.dependency.management_key();
                let depth = graph
                    .find_declared_dependency_depth(source.owner(), &key)
                    .unwrap_or(entry.depth)
                    + 1;
                let candidate = ManagementEntry {
                    dependency: entry.dependency.clone(),
                    depth,
                    provenance: Provenance::Imported,
                    source: entry.source.clone(),
                };

                let replace = match target.get(&key) {
                    None => true,
                    Some(existing) if existing.provenance == Provenance::Direct => false,
                    Some(existing) if nearest && depth < existing.depth => {
                        tracing::debug!(
                            "{}: {key} from {} (depth {depth}) overrides {} (depth {})",
                            target.owner(),
                            candidate.source,
                            existing.source,
                            existing.depth
                        );
                        true
                    }
                    Some(_) => false,
                };
                if replace {
                    target.insert(candidate);
                }
            }
        }
    }
}
