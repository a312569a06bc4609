use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use pomdep_util::errors::PomdepError;

use crate::scope::Scope;

/// Resolver settings, usually loaded from a `pomdep.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub management: ManagementConfig,

    #[serde(default)]
    pub traversal: TraversalConfig,

    #[serde(default)]
    pub mediation: MediationConfig,

    /// Repository ID to local directory in Maven layout.
    #[serde(default)]
    pub repositories: BTreeMap<String, String>,
}

/// Dependency-management merge settings from `[management]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementConfig {
    /// When set, the nearest declaration of an imported management key wins
    /// regardless of import order.
    #[serde(default = "default_nearest_match", rename = "nearest-match")]
    pub nearest_match: bool,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            nearest_match: default_nearest_match(),
        }
    }
}

fn default_nearest_match() -> bool {
    true
}

/// Tree traversal settings from `[traversal]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalConfig {
    #[serde(default = "default_max_depth", rename = "max-depth")]
    pub max_depth: usize,
    /// Scopes whose subtrees are never entered.
    #[serde(default = "default_skip_scopes", rename = "skip-scopes")]
    pub skip_scopes: Vec<Scope>,
    /// Keep optional dependencies of transitive modules.
    #[serde(default, rename = "include-optional")]
    pub include_optional: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            skip_scopes: default_skip_scopes(),
            include_optional: false,
        }
    }
}

fn default_max_depth() -> usize {
    256
}

fn default_skip_scopes() -> Vec<Scope> {
    vec![Scope::System]
}

/// Conflict mediation settings from `[mediation]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediationConfig {
    #[serde(default)]
    pub policy: ConflictPolicy,
}

/// How one version is chosen when a `group:artifact` is reached more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// The first occurrence in breadth-first order wins.
    #[default]
    Nearest,
    /// The highest version among all occurrences wins.
    Highest,
}

impl ResolverConfig {
    /// Parse configuration from a TOML string.
    pub fn parse_toml(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            PomdepError::Config {
                message: format!("Failed to parse resolver config: {e}"),
            }
            .into()
        })
    }

    /// Load configuration from a file, or return defaults if it doesn't exist.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        match pomdep_util::fs::read_if_exists(path) {
            Ok(Some(content)) => Self::parse_toml(&content),
            Ok(None) => Ok(Self::default()),
            Err(e) => Err(PomdepError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            }
            .into()),
        }
    }
}
