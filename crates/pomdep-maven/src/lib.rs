//! Maven descriptor formats: POM parsing into module descriptors,
//! `maven-metadata.xml` version listings, and the repository directory layout.

pub mod layout;
pub mod metadata;
pub mod pom;
