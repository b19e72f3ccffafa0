use assert_cmd::Command;
use predicates::prelude::*;

fn money_mind(workdir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("money-mind").unwrap();
    cmd.current_dir(workdir).env("XDG_CONFIG_HOME", workdir);
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    money_mind(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("topics"));
}

#[test]
fn test_topics_prints_rotation() {
    let dir = tempfile::tempdir().unwrap();
    money_mind(dir.path())
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("How the rich think about money"))
        .stdout(predicate::str::contains("5 passive income ideas for teens"));
}

#[test]
fn test_config_template_is_yaml() {
    let dir = tempfile::tempdir().unwrap();
    money_mind(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("music_gain: 0.12"))
        .stdout(predicate::str::contains("outputs: outputs"));
}

#[test]
fn test_local_config_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("money-mind.yaml"), "render:\n  fps: 30\n").unwrap();
    money_mind(dir.path())
        .args(["config", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@ 30 fps"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("money-mind.yaml"), "render:\n  fps: 0\n").unwrap();
    money_mind(dir.path())
        .args(["config", "--show"])
        .assert()
        .failure();
}
