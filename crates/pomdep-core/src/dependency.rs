use std::fmt;
use std::path::PathBuf;

use crate::coordinate::{Coordinate, ManagementKey};
use crate::scope::Scope;
use crate::DEFAULT_TYPE;

/// A dependency as declared by a module descriptor or a management table.
///
/// Every field a management entry can supply is optional so that "left unset"
/// is distinguishable from "explicitly declared".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub group_id: String,
    pub artifact_id: String,
    /// Literal version or range expression.
    pub version: Option<String>,
    pub type_: String,
    pub classifier: Option<String>,
    pub scope: Option<Scope>,
    pub optional: Option<bool>,
    pub exclusions: Vec<Exclusion>,
    /// Filesystem path, only meaningful for `system` scope.
    pub system_path: Option<PathBuf>,
}

/// A transitive dependency to exclude. Either field may be `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exclusion {
    pub group_id: String,
    pub artifact_id: String,
}

impl Dependency {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            type_: DEFAULT_TYPE.to_string(),
            classifier: None,
            scope: None,
            optional: None,
            exclusions: Vec::new(),
            system_path: None,
        }
    }

    /// Parse `g:a:v` (or the longer coordinate forms) into a dependency.
    pub fn parse(s: &str) -> Option<Self> {
        Coordinate::parse(s).map(|c| Self::from_coordinate(&c))
    }

    pub fn from_coordinate(coordinate: &Coordinate) -> Self {
        let mut dep = Self::new(
            &coordinate.group_id,
            &coordinate.artifact_id,
            Some(&coordinate.version),
        );
        dep.type_ = coordinate.type_.clone();
        dep.classifier = coordinate.classifier.clone();
        dep
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn with_type(mut self, type_: &str) -> Self {
        self.type_ = type_.to_string();
        self
    }

    pub fn with_exclusion(mut self, group_id: &str, artifact_id: &str) -> Self {
        self.exclusions.push(Exclusion::new(group_id, artifact_id));
        self
    }

    pub fn management_key(&self) -> ManagementKey {
        ManagementKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            type_: self.type_.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// Coordinate with the declared version, if any.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.version
            .as_deref()
            .map(|v| self.coordinate_with_version(v))
    }

    pub fn coordinate_with_version(&self, version: &str) -> Coordinate {
        Coordinate {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: version.to_string(),
            type_: self.type_.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// Rewrite the identity fields to point at `coordinate`, keeping
    /// scope, optionality and exclusions.
    pub fn with_coordinate(&self, coordinate: &Coordinate) -> Self {
        Self {
            group_id: coordinate.group_id.clone(),
            artifact_id: coordinate.artifact_id.clone(),
            version: Some(coordinate.version.clone()),
            type_: coordinate.type_.clone(),
            classifier: coordinate.classifier.clone(),
            ..self.clone()
        }
    }

    pub fn scope_or_default(&self) -> Scope {
        self.scope.unwrap_or_default()
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }

    /// Whether this management entry imports a bill of materials.
    pub fn is_bom_import(&self) -> bool {
        self.scope == Some(Scope::Import) && self.type_ == "pom"
    }

    /// `group:artifact` identifier (without version).
    pub fn ga(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.group_id,
            self.artifact_id,
            self.version.as_deref().unwrap_or("?")
        )?;
        if let Some(scope) = self.scope {
            write!(f, " ({scope})")?;
        }
        Ok(())
    }
}

impl Exclusion {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
        }
    }

    /// Whether this exclusion matches the given `group:artifact`.
    pub fn matches(&self, group_id: &str, artifact_id: &str) -> bool {
        (self.group_id == "*" || self.group_id == group_id)
            && (self.artifact_id == "*" || self.artifact_id == artifact_id)
    }
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}
