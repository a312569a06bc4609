//! Problems accumulated during resolution instead of being raised.

use std::fmt;
use std::sync::Mutex;

/// Problem severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("ERROR"),
            Severity::Warning => f.write_str("WARNING"),
        }
    }
}

/// What went wrong. Each kind has a default severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// No descriptor exists for a coordinate; its subtree stops.
    MissingDescriptor,
    /// A descriptor exists but could not be read or parsed.
    InvalidDescriptor,
    /// A version constraint matched no available version.
    MissingVersion,
    /// A relocation chain revisits a coordinate.
    CyclicRelocation,
    /// A dependency has no version and no management entry supplies one.
    MissingManagedVersion,
    /// A parent chain revisits a coordinate.
    AncestryCycle,
    /// BOM imports revisit a coordinate.
    ImportCycle,
    /// A declared parent could not be loaded.
    UnresolvableParent,
    /// A BOM import could not be loaded or has no version.
    UnresolvableImport,
    /// A dependency path revisits a coordinate already being expanded.
    DependencyCycle,
    /// Traversal stopped at the configured depth bound.
    DepthLimit,
}

impl ProblemKind {
    pub fn default_severity(self) -> Severity {
        match self {
            ProblemKind::MissingDescriptor
            | ProblemKind::DependencyCycle
            | ProblemKind::DepthLimit => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A single accumulated problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    pub kind: ProblemKind,
    pub message: String,
    /// Rendered cause, when the problem wraps an underlying error.
    pub cause: Option<String>,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// Shared sink for problems. Safe for concurrent appends.
#[derive(Debug, Default)]
pub struct ProblemCollector {
    problems: Mutex<Vec<Problem>>,
}

impl ProblemCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        severity: Severity,
        kind: ProblemKind,
        message: impl Into<String>,
        cause: Option<String>,
    ) {
        let problem = Problem {
            severity,
            kind,
            message: message.into(),
            cause,
        };
        match severity {
            Severity::Error => tracing::warn!(kind = ?kind, "{problem}"),
            Severity::Warning => tracing::debug!(kind = ?kind, "{problem}"),
        }
        self.lock().push(problem);
    }

    /// Add a problem at the kind's default severity.
    pub fn report(&self, kind: ProblemKind, message: impl Into<String>) {
        self.add(kind.default_severity(), kind, message, None);
    }

    /// Add a problem at the kind's default severity with a cause.
    pub fn report_with_cause(
        &self,
        kind: ProblemKind,
        message: impl Into<String>,
        cause: impl fmt::Display,
    ) {
        self.add(
            kind.default_severity(),
            kind,
            message,
            Some(cause.to_string()),
        );
    }

    /// Snapshot of all problems in insertion order.
    pub fn problems(&self) -> Vec<Problem> {
        self.lock().clone()
    }

    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn count(&self, kind: ProblemKind) -> usize {
        self.lock().iter().filter(|p| p.kind == kind).count()
    }

    pub fn has_errors(&self) -> bool {
        self.lock().iter().any(|p| p.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Problem>> {
        self.problems
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
