//! Dependency resolution engine: builds the transitive dependency tree of a
//! root module, applying dependency management, scope propagation,
//! exclusions, relocations and version ranges, then flattens it with
//! nearest-wins conflict mediation.

pub mod builder;
pub mod conflict;
pub mod cycle;
pub mod flatten;
pub mod graph;
pub mod local;
pub mod management;
pub mod mediator;
pub mod memory;
pub mod model;
pub mod reader;
pub mod relocation;
pub mod scope;
pub mod strategy;
pub mod version;
