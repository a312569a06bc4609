//! POM file parsing into [`ModuleDescriptor`]s: dependencies, dependency
//! management, parent reference, properties, relocation, repositories.

use std::path::PathBuf;

use pomdep_core::coordinate::Coordinate;
use pomdep_core::dependency::{Dependency, Exclusion};
use pomdep_core::descriptor::{ModuleDescriptor, Relocation};
use pomdep_core::repository::RemoteRepository;
use pomdep_core::scope::Scope;
use pomdep_util::errors::PomdepError;
use quick_xml::events::Event;
use quick_xml::Reader;

const DEPENDENCY: &str = "project>dependencies>dependency";
const MANAGED_DEPENDENCY: &str = "project>dependencyManagement>dependencies>dependency";
const RELOCATION: &str = "project>distributionManagement>relocation";
const REPOSITORY: &str = "project>repositories>repository";

#[derive(Default)]
struct ParentFields {
    group_id: String,
    artifact_id: String,
    version: String,
}

#[derive(Default)]
struct RepositoryFields {
    id: String,
    url: String,
}

/// Parse a POM XML string into a raw (uninterpolated, uninherited) descriptor.
pub fn parse_pom(xml: &str) -> miette::Result<ModuleDescriptor> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = ModuleDescriptor::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<Dependency> = None;
    let mut current_exclusion: Option<Exclusion> = None;
    let mut current_parent: Option<ParentFields> = None;
    let mut current_repo: Option<RepositoryFields> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();

                let ctx = path.join(">");
                match ctx.as_str() {
                    DEPENDENCY | MANAGED_DEPENDENCY => {
                        current_dep = Some(Dependency::new("", "", None));
                    }
                    "project>parent" => current_parent = Some(ParentFields::default()),
                    RELOCATION => pom.relocation = Some(Relocation::default()),
                    REPOSITORY => current_repo = Some(RepositoryFields::default()),
                    _ if current_dep.is_some() && ctx.ends_with(">exclusions>exclusion") => {
                        current_exclusion = Some(Exclusion::new("", "*"));
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().trim().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");
                let text = std::mem::take(&mut text_buf);

                if let Some((managed, tail)) = dependency_field(&ctx) {
                    if let Some(ref mut dep) = current_dep {
                        apply_dependency_field(dep, &mut current_exclusion, tail, text.clone());
                    }
                    if tail.is_empty() {
                        if let Some(dep) = current_dep.take() {
                            if managed {
                                pom.dependency_management.push(dep);
                            } else {
                                pom.dependencies.push(dep);
                            }
                        }
                    }
                }

                if let Some(ref mut parent) = current_parent {
                    match ctx.as_str() {
                        "project>parent>groupId" => parent.group_id = text.clone(),
                        "project>parent>artifactId" => parent.artifact_id = text.clone(),
                        "project>parent>version" => parent.version = text.clone(),
                        "project>parent" => {
                            if let Some(p) = current_parent.take() {
                                pom.parent = Some(
                                    Coordinate::new(&p.group_id, &p.artifact_id, &p.version)
                                        .with_type("pom"),
                                );
                            }
                        }
                        _ => {}
                    }
                }

                if let Some(ref mut relocation) = pom.relocation {
                    if let Some(field) = ctx.strip_prefix(RELOCATION) {
                        match field {
                            ">groupId" => relocation.group_id = Some(text.clone()),
                            ">artifactId" => relocation.artifact_id = Some(text.clone()),
                            ">version" => relocation.version = Some(text.clone()),
                            ">message" => relocation.message = Some(text.clone()),
                            _ => {}
                        }
                    }
                }

                if let Some(ref mut repo) = current_repo {
                    match ctx.strip_prefix(REPOSITORY) {
                        Some(">id") => repo.id = text.clone(),
                        Some(">url") => repo.url = text.clone(),
                        Some("") => {
                            if let Some(r) = current_repo.take() {
                                pom.repositories.push(RemoteRepository::new(&r.id, &r.url));
                            }
                        }
                        _ => {}
                    }
                }

                // Properties: <project><properties><key>value</key></properties>
                if path.len() == 3 && path[1] == "properties" {
                    pom.properties.insert(path[2].clone(), text.clone());
                }

                if path.len() == 2 {
                    match path[1].as_str() {
                        "groupId" => pom.group_id = Some(text),
                        "artifactId" => pom.artifact_id = text,
                        "version" => pom.version = Some(text),
                        "packaging" => pom.packaging = Some(text),
                        _ => {}
                    }
                }

                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomdepError::Descriptor {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    if pom.artifact_id.is_empty() {
        return Err(PomdepError::Descriptor {
            message: "POM declares no artifactId".to_string(),
        }
        .into());
    }

    Ok(pom)
}

/// Split a context path inside a `<dependency>` element into
/// `(is_managed, tail)`, where `tail` is empty for the element itself.
fn dependency_field(ctx: &str) -> Option<(bool, &str)> {
    if let Some(tail) = ctx.strip_prefix(MANAGED_DEPENDENCY) {
        return Some((true, tail));
    }
    ctx.strip_prefix(DEPENDENCY).map(|tail| (false, tail))
}

fn apply_dependency_field(
    dep: &mut Dependency,
    exclusion: &mut Option<Exclusion>,
    tail: &str,
    text: String,
) {
    match tail {
        ">groupId" => dep.group_id = text,
        ">artifactId" => dep.artifact_id = text,
        ">version" => dep.version = Some(text),
        ">type" => dep.type_ = text,
        ">classifier" => dep.classifier = Some(text),
        ">optional" => dep.optional = Some(text == "true"),
        ">systemPath" => dep.system_path = Some(PathBuf::from(text)),
        ">scope" => match text.parse::<Scope>() {
            Ok(scope) => dep.scope = Some(scope),
            Err(e) => tracing::warn!("{}:{}: {e}, using default", dep.group_id, dep.artifact_id),
        },
        ">exclusions>exclusion>groupId" => {
            if let Some(excl) = exclusion {
                excl.group_id = text;
            }
        }
        ">exclusions>exclusion>artifactId" => {
            if let Some(excl) = exclusion {
                excl.artifact_id = text;
            }
        }
        ">exclusions>exclusion" => {
            if let Some(excl) = exclusion.take() {
                dep.exclusions.push(excl);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>my-lib</artifactId>
    <version>1.0.0</version>
    <packaging>jar</packaging>

    <properties>
        <kotlin.version>2.3.0</kotlin.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.jetbrains.kotlin</groupId>
            <artifactId>kotlin-stdlib</artifactId>
            <version>${kotlin.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_simple_pom() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert_eq!(pom.group_id.as_deref(), Some("org.example"));
        assert_eq!(pom.artifact_id, "my-lib");
        assert_eq!(pom.version.as_deref(), Some("1.0.0"));
        assert_eq!(pom.packaging.as_deref(), Some("jar"));
        assert_eq!(pom.dependencies.len(), 2);
        assert_eq!(pom.properties.get("kotlin.version").unwrap(), "2.3.0");
    }

    #[test]
    fn property_interpolation() {
        let mut pom = parse_pom(SIMPLE_POM).unwrap();
        pom.resolve_properties();
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("2.3.0"));
    }

    #[test]
    fn scope_parsing() {
        let pom = parse_pom(SIMPLE_POM).unwrap();
        assert_eq!(pom.dependencies[0].scope, None);
        assert_eq!(pom.dependencies[1].scope, Some(Scope::Test));
    }

    #[test]
    fn missing_artifact_id_is_error() {
        let err = parse_pom("<project><groupId>g</groupId></project>").unwrap_err();
        assert!(err.to_string().contains("artifactId"), "got: {err}");
    }
}
