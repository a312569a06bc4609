//! Artifact coordinates and the version-less management key.

use std::fmt;

use crate::DEFAULT_TYPE;

/// Full artifact identity: `group:artifact:type:classifier:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub type_: String,
    pub classifier: Option<String>,
}

/// Identity used for dependency management and exclusion matching.
///
/// Same fields as [`Coordinate`] minus the version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagementKey {
    pub group_id: String,
    pub artifact_id: String,
    pub type_: String,
    pub classifier: Option<String>,
}

impl Coordinate {
    /// A `jar` coordinate without classifier.
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            type_: DEFAULT_TYPE.to_string(),
            classifier: None,
        }
    }

    /// Parse `g:a:v`, `g:a:type:v` or `g:a:type:classifier:v`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match parts.as_slice() {
            [g, a, v] => Some(Self::new(g, a, v)),
            [g, a, t, v] => Some(Self::new(g, a, v).with_type(t)),
            [g, a, t, c, v] => Some(Self::new(g, a, v).with_type(t).with_classifier(c)),
            _ => None,
        }
    }

    pub fn with_type(mut self, type_: &str) -> Self {
        self.type_ = type_.to_string();
        self
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_version(&self, version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..self.clone()
        }
    }

    pub fn management_key(&self) -> ManagementKey {
        ManagementKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            type_: self.type_.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// `group:artifact` identifier (without version).
    pub fn ga(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// `group:artifact:version`, the key used for relocation and cycle tracking.
    pub fn gav(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)?;
        match &self.classifier {
            Some(c) => write!(f, ":{}:{}", self.type_, c)?,
            None if self.type_ != DEFAULT_TYPE => write!(f, ":{}", self.type_)?,
            None => {}
        }
        write!(f, ":{}", self.version)
    }
}

impl ManagementKey {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            type_: DEFAULT_TYPE.to_string(),
            classifier: None,
        }
    }

    pub fn with_type(mut self, type_: &str) -> Self {
        self.type_ = type_.to_string();
        self
    }
}

impl fmt::Display for ManagementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.type_)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{c}")?;
        }
        Ok(())
    }
}
