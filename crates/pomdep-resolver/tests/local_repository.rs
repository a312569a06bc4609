use std::fs;
use std::path::{Path, PathBuf};

use pomdep_core::config::ResolverConfig;
use pomdep_core::dependency::Dependency;
use pomdep_core::problem::ProblemKind;
use pomdep_maven::layout;
use pomdep_resolver::builder::DependencyGraphBuilder;
use pomdep_resolver::local::LocalRepositoryReader;
use tempfile::TempDir;

fn write_pom(root: &Path, g: &str, a: &str, v: &str, body: &str) {
    let path = layout::pom_file(root, g, a, v);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        format!(
            "<project>\n  <groupId>{g}</groupId>\n  <artifactId>{a}</artifactId>\n  <version>{v}</version>\n{body}</project>\n"
        ),
    )
    .unwrap();
}

fn write_metadata(root: &Path, g: &str, a: &str, versions: &[&str]) {
    let dir = root.join(layout::artifact_path(g, a));
    fs::create_dir_all(&dir).unwrap();
    let listed: String = versions
        .iter()
        .map(|v| format!("      <version>{v}</version>\n"))
        .collect();
    fs::write(
        dir.join("maven-metadata.xml"),
        format!(
            "<metadata>\n  <groupId>{g}</groupId>\n  <artifactId>{a}</artifactId>\n  <versioning>\n    <versions>\n{listed}    </versions>\n  </versioning>\n</metadata>\n"
        ),
    )
    .unwrap();
}

fn reader(root: &TempDir) -> LocalRepositoryReader {
    LocalRepositoryReader::new(vec![("local".to_string(), root.path().to_path_buf())])
}

fn root_dep() -> Dependency {
    Dependency::parse("org.example:app:1.0").unwrap()
}

#[test]
fn resolves_tree_from_disk() {
    let repo = TempDir::new().unwrap();
    write_pom(
        repo.path(),
        "org.example",
        "app",
        "1.0",
        r#"  <properties>
    <lib.version>2.1</lib.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>lib</artifactId>
      <version>${lib.version}</version>
    </dependency>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>testkit</artifactId>
      <version>1.0</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
"#,
    );
    write_pom(
        repo.path(),
        "org.example",
        "lib",
        "2.1",
        r#"  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>util</artifactId>
      <version>[1.0,2.0)</version>
    </dependency>
  </dependencies>
"#,
    );
    write_pom(repo.path(), "org.example", "testkit", "1.0", "");
    write_pom(repo.path(), "org.example", "util", "1.4", "");
    write_pom(repo.path(), "org.example", "util", "2.0", "");

    let res = DependencyGraphBuilder::default()
        .resolve(&root_dep(), &reader(&repo))
        .unwrap();
    assert!(res.problems.is_empty(), "{:?}", res.problems);

    let rendered = res.tree.render(None);
    assert!(rendered.contains("org.example:lib:2.1 (compile)"), "{rendered}");
    assert!(rendered.contains("org.example:util:1.4 (compile)"), "{rendered}");
    assert!(rendered.contains("org.example:testkit:1.0 (test)"), "{rendered}");
    assert!(!rendered.contains("util:2.0"));
}

#[test]
fn parent_inheritance_from_disk() {
    let repo = TempDir::new().unwrap();
    write_pom(
        repo.path(),
        "org.example",
        "parent",
        "3",
        r#"  <packaging>pom</packaging>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.example</groupId>
        <artifactId>lib</artifactId>
        <version>1.2</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
"#,
    );
    let app = layout::pom_file(repo.path(), "org.example", "app", "1.0");
    fs::create_dir_all(app.parent().unwrap()).unwrap();
    fs::write(
        &app,
        r#"<project>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>3</version>
  </parent>
  <artifactId>app</artifactId>
  <version>1.0</version>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>lib</artifactId>
    </dependency>
  </dependencies>
</project>
"#,
    )
    .unwrap();
    write_pom(repo.path(), "org.example", "lib", "1.2", "");

    let res = DependencyGraphBuilder::default()
        .resolve(&root_dep(), &reader(&repo))
        .unwrap();
    let lib = res.tree.find("org.example:lib")[0];
    assert_eq!(res.tree.node(lib).version(), "1.2");
}

#[test]
fn listed_version_without_pom_is_a_warning() {
    let repo = TempDir::new().unwrap();
    write_pom(
        repo.path(),
        "org.example",
        "app",
        "1.0",
        r#"  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>ghost</artifactId>
      <version>1.0</version>
    </dependency>
  </dependencies>
"#,
    );
    write_metadata(repo.path(), "org.example", "ghost", &["1.0"]);

    let res = DependencyGraphBuilder::default()
        .resolve(&root_dep(), &reader(&repo))
        .unwrap();
    let ghost = res.tree.find("ghost")[0];
    assert!(!res.tree.node(ghost).is_resolved());
    assert!(res.tree.render(None).contains("(unresolved)"));
    assert!(res
        .problems
        .iter()
        .any(|p| p.kind == ProblemKind::MissingDescriptor));
}

#[test]
fn malformed_pom_is_an_error_problem() {
    let repo = TempDir::new().unwrap();
    write_pom(
        repo.path(),
        "org.example",
        "app",
        "1.0",
        r#"  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>broken</artifactId>
      <version>1.0</version>
    </dependency>
  </dependencies>
"#,
    );
    let broken = layout::pom_file(repo.path(), "org.example", "broken", "1.0");
    fs::create_dir_all(broken.parent().unwrap()).unwrap();
    fs::write(&broken, "<project><artifactId>broken</wrong></project>").unwrap();

    let res = DependencyGraphBuilder::default()
        .resolve(&root_dep(), &reader(&repo))
        .unwrap();
    let invalid = res
        .problems
        .iter()
        .find(|p| p.kind == ProblemKind::InvalidDescriptor)
        .unwrap();
    assert!(invalid.cause.is_some());
    assert!(res.has_errors());
}

#[test]
fn declared_file_repository_is_consulted() {
    let main = TempDir::new().unwrap();
    let extra = TempDir::new().unwrap();
    let url = format!("file://{}", extra.path().display());
    write_pom(
        main.path(),
        "org.example",
        "app",
        "1.0",
        &format!(
            r#"  <repositories>
    <repository>
      <id>extra</id>
      <url>{url}</url>
    </repository>
  </repositories>
  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>lib</artifactId>
      <version>1.0</version>
    </dependency>
  </dependencies>
"#
        ),
    );
    write_pom(extra.path(), "org.example", "lib", "1.0", "");

    let res = DependencyGraphBuilder::default()
        .resolve(&root_dep(), &reader(&main))
        .unwrap();
    let lib = res.tree.node(res.tree.find("org.example:lib")[0]);
    assert!(lib.is_resolved());
    assert_eq!(lib.repository_id.as_deref(), Some("extra"));
}

#[test]
fn reader_from_config_file() {
    let repo = TempDir::new().unwrap();
    write_pom(repo.path(), "org.example", "app", "1.0", "");
    let config_path: PathBuf = repo.path().join("pomdep.toml");
    fs::write(
        &config_path,
        format!(
            "[repositories]\nlocal = {:?}\n",
            repo.path().display().to_string()
        ),
    )
    .unwrap();

    let config = ResolverConfig::from_path(&config_path).unwrap();
    let reader = LocalRepositoryReader::from_config(&config);
    assert_eq!(reader.roots().len(), 1);
    let res = DependencyGraphBuilder::new(config)
        .resolve(&root_dep(), &reader)
        .unwrap();
    assert!(res.tree.root_node().is_resolved());
}
