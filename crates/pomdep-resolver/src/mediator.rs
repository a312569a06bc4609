//! Version mediation: expanding constraints to concrete versions and
//! arbitrating between two occurrences of the same artifact.

use std::collections::HashMap;

use pomdep_core::config::ConflictPolicy;
use pomdep_util::errors::PomdepResult;

use crate::reader::RepositoryReader;
use crate::version::{MavenVersion, VersionConstraint};

/// Concrete versions matching a constraint, ascending, with the repository
/// that first exposed each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionResolution {
    pub versions: Vec<String>,
    pub repositories: HashMap<String, String>,
}

impl VersionResolution {
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn repository_for(&self, version: &str) -> Option<&str> {
        self.repositories.get(version).map(String::as_str)
    }

    pub fn highest(&self) -> Option<&str> {
        self.versions.last().map(String::as_str)
    }
}

/// One occurrence of an artifact competing in a conflict.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub version: &'a str,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    KeepIncumbent,
    TakeChallenger,
}

pub struct VersionMediator;

impl VersionMediator {
    /// Expand `constraint` for `group:artifact` against `reader`.
    ///
    /// A literal yields itself only if some repository lists it. Versions
    /// that compare equal (`1.0` and `1.0.0`) are reported once, under the
    /// first spelling seen.
    pub fn resolve_versions<R: RepositoryReader>(
        reader: &R,
        group_id: &str,
        artifact_id: &str,
        constraint: &VersionConstraint,
    ) -> PomdepResult<VersionResolution> {
        let mut found: Vec<(MavenVersion, String)> = Vec::new();
        let mut resolution = VersionResolution::default();

        for listed in reader.list_versions(group_id, artifact_id, constraint)? {
            let parsed = MavenVersion::parse(&listed.version);
            if !constraint.contains(&parsed) || found.iter().any(|(v, _)| *v == parsed) {
                continue;
            }
            resolution
                .repositories
                .insert(listed.version.clone(), listed.repository_id);
            found.push((parsed, listed.version));
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        resolution.versions = found.into_iter().map(|(_, v)| v).collect();
        tracing::trace!(
            "{group_id}:{artifact_id}:{constraint} -> {:?}",
            resolution.versions
        );
        Ok(resolution)
    }

    /// Decide whether `challenger`, reached after `incumbent` in
    /// breadth-first order, replaces it.
    ///
    /// Under [`ConflictPolicy::Nearest`] only a strictly shallower occurrence
    /// wins, so ties go to the first reached. Under
    /// [`ConflictPolicy::Highest`] only a strictly higher version wins.
    pub fn arbitrate(policy: ConflictPolicy, incumbent: Candidate<'_>, challenger: Candidate<'_>) -> Arbitration {
        let challenger_wins = match policy {
            ConflictPolicy::Nearest => challenger.depth < incumbent.depth,
            ConflictPolicy::Highest => {
                MavenVersion::parse(challenger.version) > MavenVersion::parse(incumbent.version)
            }
        };
        if challenger_wins {
            Arbitration::TakeChallenger
        } else {
            Arbitration::KeepIncumbent
        }
    }
}
