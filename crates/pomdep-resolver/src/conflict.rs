//! Version conflicts recorded while flattening a dependency tree.

use std::fmt;

use pomdep_core::config::ConflictPolicy;

/// All version conflicts encountered while flattening.
#[derive(Debug, Default, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// One occurrence of an artifact lost to another occurrence with a
/// different version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    /// `group:artifact`
    pub key: String,
    pub requested: String,
    pub requested_depth: usize,
    pub resolved: String,
    pub resolved_depth: usize,
    pub policy: ConflictPolicy,
}

impl VersionConflict {
    pub fn reason(&self) -> String {
        match self.policy {
            ConflictPolicy::Nearest => format!(
                "nearest wins (depth {} vs {})",
                self.resolved_depth, self.requested_depth
            ),
            ConflictPolicy::Highest => "highest wins".to_string(),
        }
    }
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, conflict: VersionConflict) {
        self.conflicts.push(conflict);
    }

    /// Conflicts for one `group:artifact`.
    pub fn for_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a VersionConflict> {
        self.conflicts.iter().filter(move |c| c.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(
                f,
                "  {} requested {} but resolved {} ({})",
                c.key,
                c.requested,
                c.resolved,
                c.reason()
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({})",
            self.key,
            self.requested,
            self.resolved,
            self.reason()
        )
    }
}
