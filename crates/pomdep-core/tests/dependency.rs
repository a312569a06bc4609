use pomdep_core::coordinate::Coordinate;
use pomdep_core::dependency::{Dependency, Exclusion};
use pomdep_core::scope::Scope;

#[test]
fn coordinate_parse_three_parts() {
    let coord = Coordinate::parse("com.example:my-lib:1.0.0").unwrap();
    assert_eq!(coord.group_id, "com.example");
    assert_eq!(coord.artifact_id, "my-lib");
    assert_eq!(coord.version, "1.0.0");
    assert_eq!(coord.type_, "jar");
}

#[test]
fn coordinate_parse_with_type_and_classifier() {
    let coord = Coordinate::parse("com.example:my-lib:jar:sources:1.0.0").unwrap();
    assert_eq!(coord.classifier.as_deref(), Some("sources"));
    let pom = Coordinate::parse("com.example:bom:pom:1.0.0").unwrap();
    assert_eq!(pom.type_, "pom");
}

#[test]
fn coordinate_parse_rejects_bad_input() {
    assert!(Coordinate::parse("group:artifact").is_none());
    assert!(Coordinate::parse("").is_none());
    assert!(Coordinate::parse("g::1.0").is_none());
}

#[test]
fn coordinate_display_roundtrip() {
    let s = "com.example:my-lib:1.0.0";
    assert_eq!(Coordinate::parse(s).unwrap().to_string(), s);
}

#[test]
fn dependency_defaults() {
    let dep = Dependency::parse("org.example:lib:1.0").unwrap();
    assert_eq!(dep.scope, None);
    assert_eq!(dep.scope_or_default(), Scope::Compile);
    assert!(!dep.is_optional());
    assert_eq!(
        dep.coordinate(),
        Some(Coordinate::new("org.example", "lib", "1.0"))
    );
}

#[test]
fn versionless_dependency_has_no_coordinate() {
    let dep = Dependency::new("org.example", "lib", None);
    assert!(dep.coordinate().is_none());
    assert_eq!(dep.to_string(), "org.example:lib:?");
}

#[test]
fn with_coordinate_keeps_metadata() {
    let dep = Dependency::parse("old:lib:1.0")
        .unwrap()
        .with_scope(Scope::Runtime)
        .with_exclusion("x", "y");
    let moved = dep.with_coordinate(&Coordinate::new("new", "lib", "2.0"));
    assert_eq!(moved.group_id, "new");
    assert_eq!(moved.version.as_deref(), Some("2.0"));
    assert_eq!(moved.scope, Some(Scope::Runtime));
    assert_eq!(moved.exclusions, vec![Exclusion::new("x", "y")]);
}

#[test]
fn bom_import_detection() {
    let bom = Dependency::parse("org.example:bom:1.0")
        .unwrap()
        .with_type("pom")
        .with_scope(Scope::Import);
    assert!(bom.is_bom_import());
    let plain = Dependency::parse("org.example:bom:1.0")
        .unwrap()
        .with_scope(Scope::Import);
    assert!(!plain.is_bom_import());
}

#[test]
fn exclusion_wildcards() {
    assert!(Exclusion::new("org.example", "lib").matches("org.example", "lib"));
    assert!(!Exclusion::new("org.example", "lib").matches("org.example", "other"));
    assert!(Exclusion::new("org.example", "*").matches("org.example", "other"));
    assert!(Exclusion::new("*", "*").matches("any", "thing"));
}

#[test]
fn scope_parse_and_display() {
    assert_eq!("Test".parse::<Scope>().unwrap(), Scope::Test);
    assert_eq!(Scope::System.to_string(), "system");
    assert!("bogus".parse::<Scope>().is_err());
    assert_eq!(Scope::default(), Scope::Compile);
}
