//! Shared utilities for pomdep.
//!
//! Cross-cutting concerns used by the other pomdep crates: the unified error
//! type and a couple of filesystem helpers.

pub mod errors;
pub mod fs;
