use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn sample_project(root: &Path) {
    write(
        root,
        "lib/Acme/Alpha.pm",
        "package Acme::Alpha;\n\n=head1 NAME\n\nAcme::Alpha - first\n\n=head1 SEE ALSO\n\nAcme::Beta\n\n=cut\n\n1;\n",
    );
    write(
        root,
        "lib/Acme/Beta.pm",
        "package Acme::Beta;\n\n=head1 NAME\n\nAcme::Beta - second\n\n=cut\n\n1;\n",
    );
    write(
        root,
        "projdocs.yml",
        r#"
project:
  title: "Acme"
paths:
  output: "docs"
  libraries: ["lib"]
"#,
    );
}

#[allow(deprecated)]
fn projdocs() -> Command {
    Command::cargo_bin("projdocs").unwrap()
}

#[test]
fn build_writes_pages_index_and_assets() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    sample_project(dir.path());

    projdocs()
        .current_dir(dir.path())
        .arg("build")
        .assert()
        .success();

    let docs = dir.path().join("docs");
    let alpha = fs::read_to_string(docs.join("Acme/Alpha.pm.html"))?;
    assert!(alpha.contains(r#"<a href="Beta.pm.html">Acme::Beta</a>"#));
    assert!(docs.join("Acme/Beta.pm.html").is_file());
    assert!(docs.join("src/Acme/Beta.pm").is_file());
    assert!(docs.join("podstyle.css").is_file());
    assert!(docs.join("up.svg").is_file());

    let index = fs::read_to_string(docs.join("index.html"))?;
    assert!(index.contains(r#"<a href="Acme/Alpha.pm.html">Acme::Alpha</a>"#));

    let json: Value = serde_json::from_str(&fs::read_to_string(docs.join("index.json"))?)?;
    assert_eq!(json["title"], "Acme");
    assert_eq!(json["groups"][0]["records"][1]["name"], "Acme::Beta");

    Ok(())
}

#[test]
fn rebuild_leaves_outputs_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    sample_project(dir.path());
    projdocs().current_dir(dir.path()).arg("build").assert().success();

    let docs = dir.path().join("docs");
    let files = [
        "Acme/Alpha.pm.html",
        "index.html",
        "index.json",
        "podstyle.css",
    ];
    let before: Vec<_> = files
        .iter()
        .map(|f| fs::metadata(docs.join(f)).and_then(|m| m.modified()))
        .collect::<Result<_, _>>()?;

    projdocs().current_dir(dir.path()).arg("build").assert().success();

    let after: Vec<_> = files
        .iter()
        .map(|f| fs::metadata(docs.join(f)).and_then(|m| m.modified()))
        .collect::<Result<_, _>>()?;
    assert_eq!(before, after);

    Ok(())
}

#[test]
fn status_json_reports_staleness_without_writing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    sample_project(dir.path());

    let assert = projdocs()
        .current_dir(dir.path())
        .args(["status", "--json"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["stale"], 2);
    assert_eq!(value["documents"][0]["name"], "Acme::Alpha");
    assert_eq!(value["documents"][0]["output"], "Acme/Alpha.pm.html");
    assert!(!dir.path().join("docs").exists());

    projdocs().current_dir(dir.path()).arg("build").assert().success();

    projdocs()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("fresh  Acme::Beta"))
        .stdout(predicate::str::contains("0 stale, 2 fresh"));

    Ok(())
}

#[test]
fn flags_override_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    sample_project(dir.path());

    projdocs()
        .current_dir(dir.path())
        .args([
            "build",
            "--out",
            "site",
            "--except",
            "Beta",
            "--title",
            "Override",
        ])
        .assert()
        .success();

    let site = dir.path().join("site");
    assert!(site.join("Acme/Alpha.pm.html").is_file());
    assert!(!site.join("Acme/Beta.pm.html").exists());
    assert!(!dir.path().join("docs").exists());

    let alpha = fs::read_to_string(site.join("Acme/Alpha.pm.html"))?;
    assert!(alpha.contains("<title>first | Override</title>"));
    assert!(alpha.contains("<code>Acme::Beta</code>"));

    Ok(())
}

#[test]
fn missing_library_root_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    projdocs()
        .current_dir(dir.path())
        .args(["build", "--lib", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));

    Ok(())
}

#[test]
fn explicit_config_must_exist() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    projdocs()
        .current_dir(dir.path())
        .args(["--config", "missing.yml", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.yml"));

    Ok(())
}
