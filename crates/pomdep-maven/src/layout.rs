//! Maven repository directory layout.

use std::path::{Path, PathBuf};

/// Metadata file names probed in an artifact directory, in order.
pub const METADATA_FILES: [&str; 2] = ["maven-metadata.xml", "maven-metadata-local.xml"];

/// Relative directory of an artifact: `org.example:lib` becomes `org/example/lib`.
pub fn artifact_path(group: &str, artifact: &str) -> PathBuf {
    let mut path: PathBuf = group.split('.').collect();
    path.push(artifact);
    path
}

/// Relative directory of one version of an artifact.
///
/// `org.jetbrains.kotlinx:kotlinx-coroutines-core:1.8.0` becomes
/// `org/jetbrains/kotlinx/kotlinx-coroutines-core/1.8.0`.
pub fn version_path(group: &str, artifact: &str, version: &str) -> PathBuf {
    artifact_path(group, artifact).join(version)
}

/// Location of the POM for a coordinate under a repository root.
pub fn pom_file(root: &Path, group: &str, artifact: &str, version: &str) -> PathBuf {
    root.join(version_path(group, artifact, version))
        .join(format!("{artifact}-{version}.pom"))
}

/// Candidate `maven-metadata` files for an artifact under a repository root.
pub fn metadata_files(root: &Path, group: &str, artifact: &str) -> Vec<PathBuf> {
    let dir = root.join(artifact_path(group, artifact));
    METADATA_FILES.iter().map(|f| dir.join(f)).collect()
}
