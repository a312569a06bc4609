//! Seams between the resolver and the places descriptors come from.

use std::sync::Arc;

use pomdep_core::coordinate::Coordinate;
use pomdep_core::descriptor::ModuleDescriptor;
use pomdep_core::repository::RemoteRepository;
use pomdep_util::errors::PomdepResult;

use crate::model::EffectiveModel;
use crate::version::VersionConstraint;

/// A version offered by a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedVersion {
    pub version: String,
    pub repository_id: String,
}

/// A raw descriptor together with the repository it was read from.
#[derive(Debug, Clone)]
pub struct DescribedModule {
    pub descriptor: ModuleDescriptor,
    pub repository_id: String,
}

/// Read-only access to a set of repositories.
///
/// Readers are cheap to clone and never mutated in place: extending the
/// repository set yields a new reader for the subtree that declared them.
pub trait RepositoryReader: Clone {
    /// Versions of `group:artifact` matching `constraint`, in repository order.
    fn list_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        constraint: &VersionConstraint,
    ) -> PomdepResult<Vec<ListedVersion>>;

    /// Read the descriptor of `coordinate`, trying `preferred_repository` first.
    ///
    /// `Ok(None)` means no repository holds it. `Err` means one does but its
    /// content could not be read.
    fn describe(
        &self,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
    ) -> PomdepResult<Option<DescribedModule>>;

    /// A reader that also consults `repositories`.
    fn with_additional_repositories(&self, repositories: &[RemoteRepository]) -> Self;

    /// IDs of the repositories this reader consults, in search order.
    fn repository_ids(&self) -> Vec<String>;
}

/// Produces effective (inherited, interpolated, management-merged) models.
///
/// Recoverable failures are reported to a problem collector and yield
/// `Ok(None)`. `Err` is reserved for failures that abort resolution.
pub trait ModelLoader {
    fn load(
        &self,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
    ) -> PomdepResult<Option<Arc<EffectiveModel>>>;
}
