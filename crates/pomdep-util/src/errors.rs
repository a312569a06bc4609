use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pomdep operations.
#[derive(Debug, Error, Diagnostic)]
pub enum PomdepError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A module descriptor could not be read or parsed.
    #[error("Invalid descriptor: {message}")]
    #[diagnostic(help("Check the descriptor for malformed XML or missing coordinates"))]
    Descriptor { message: String },

    /// Dependency resolution failed.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// A dependency has no version and no management entry supplies one.
    #[error("'dependencies.dependency.version' for {dependency} is missing")]
    #[diagnostic(help(
        "Declare a version on the dependency or add it to a dependencyManagement section"
    ))]
    MissingManagedVersion { dependency: String },

    /// The parent chain of a module revisits a coordinate.
    #[error("The parents form a cycle: {chain}")]
    AncestryCycle { chain: String },

    /// Invalid resolver configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check the resolver configuration file for syntax errors"))]
    Config { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PomdepResult<T> = miette::Result<T>;
