//! Core data types for pomdep.
//!
//! This crate defines the values the resolution engine passes around:
//! coordinates and management keys, dependency scopes, declared dependencies
//! and exclusions, module descriptors with relocation and repository
//! declarations, accumulated problems, and resolver configuration.
//!
//! This crate performs no repository access; the only I/O is reading a
//! configuration file.

/// Packaging type assumed when a dependency or descriptor declares none.
pub const DEFAULT_TYPE: &str = "jar";

pub mod config;
pub mod coordinate;
pub mod dependency;
pub mod descriptor;
pub mod problem;
pub mod repository;
pub mod scope;
