//! End-to-end exercises of the `drydock` binary against real, local git
//! repositories (no network access required — every dependency is a
//! `file://` path into a repo this test tags itself).

use assert_cmd::Command;
use drydock_cli::test_utils::{FileFixture, TestEnvironment};
use predicates::prelude::*;

fn drydock(env: &TestEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("drydock").unwrap();
    cmd.current_dir(env.project_path());
    cmd.env("DRYDOCK_CACHE_ROOT", env.cache_path());
    cmd
}

#[test]
fn test_bootstrap_resolves_and_writes_cartfile_resolved() {
    let env = TestEnvironment::new().unwrap();
    let source = env
        .add_mock_source("Alamofire", vec![FileFixture::new("README.md", "# Alamofire")])
        .unwrap();

    env.create_file("Cartfile", &format!("git \"file://{}\" ~> 1.0\n", source.display())).unwrap();

    drydock(&env).args(["bootstrap", "--no-build"]).assert().success();

    assert!(env.file_exists("Cartfile.resolved"));
    let resolved = env.read_file("Cartfile.resolved").unwrap();
    assert!(resolved.contains("Alamofire"));
    assert!(resolved.contains("v1.0.0"));
}

#[test]
fn test_bootstrap_is_a_no_op_when_already_resolved() {
    let env = TestEnvironment::new().unwrap();
    let source = env
        .add_mock_source("Alamofire", vec![FileFixture::new("README.md", "# Alamofire")])
        .unwrap();

    env.create_file("Cartfile", &format!("git \"file://{}\" ~> 1.0\n", source.display())).unwrap();
    env.create_file("Cartfile.resolved", &format!("git \"file://{}\" \"v1.0.0\"\n", source.display())).unwrap();

    let before = env.read_file("Cartfile.resolved").unwrap();
    drydock(&env).args(["bootstrap", "--no-build"]).assert().success();
    let after = env.read_file("Cartfile.resolved").unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_build_without_resolved_manifest_fails_with_exit_code_one() {
    let env = TestEnvironment::with_basic_manifest().unwrap();

    drydock(&env).args(["build"]).assert().code(1).stderr(predicate::str::contains("bootstrap"));
}

#[test]
fn test_update_moves_pinned_version_forward() {
    let env = TestEnvironment::new().unwrap();
    let source = env
        .add_mock_source("Alamofire", vec![FileFixture::new("README.md", "# Alamofire")])
        .unwrap();

    env.create_file("Cartfile", &format!("git \"file://{}\" >= 1.0\n", source.display())).unwrap();
    env.create_file("Cartfile.resolved", &format!("git \"file://{}\" \"v1.0.0\"\n", source.display())).unwrap();

    let repo = drydock_cli::test_utils::GitRepoFixture::new(source.clone());
    repo.commit_and_tag("v1.1.0").unwrap();

    drydock(&env).args(["update", "--no-build"]).assert().success();

    let resolved = env.read_file("Cartfile.resolved").unwrap();
    assert!(resolved.contains("v1.1.0"));
}

#[test]
fn test_outdated_reports_newer_admissible_version() {
    let env = TestEnvironment::new().unwrap();
    let source = env
        .add_mock_source("Alamofire", vec![FileFixture::new("README.md", "# Alamofire")])
        .unwrap();

    env.create_file("Cartfile", &format!("git \"file://{}\" >= 1.0\n", source.display())).unwrap();
    env.create_file("Cartfile.resolved", &format!("git \"file://{}\" \"v1.0.0\"\n", source.display())).unwrap();

    let repo = drydock_cli::test_utils::GitRepoFixture::new(source.clone());
    repo.commit_and_tag("v1.1.0").unwrap();

    drydock(&env)
        .args(["outdated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1.0.0").and(predicate::str::contains("v1.1.0")));
}

#[test]
fn test_outdated_is_silent_when_nothing_moved() {
    let env = TestEnvironment::new().unwrap();
    let source = env
        .add_mock_source("Alamofire", vec![FileFixture::new("README.md", "# Alamofire")])
        .unwrap();

    env.create_file("Cartfile", &format!("git \"file://{}\" ~> 1.0\n", source.display())).unwrap();
    env.create_file("Cartfile.resolved", &format!("git \"file://{}\" \"v1.0.0\"\n", source.display())).unwrap();

    drydock(&env).args(["outdated"]).assert().success().stdout(predicate::str::is_empty());
}
