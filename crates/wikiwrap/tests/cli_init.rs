//! Integration tests for the `wikiwrap init` command.

use assert_cmd::Command;
use assert_cmd::cargo;
use tempfile::TempDir;
use wikiwrap_types::RulesFile;

fn wikiwrap_cmd() -> Command {
    Command::new(cargo::cargo_bin!("wikiwrap"))
}

#[test]
fn init_creates_the_default_rules_file() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir).arg("init");

    cmd.assert().success();

    let rules_path = dir.join("wikiwrap.toml");
    assert!(rules_path.exists(), "wikiwrap.toml should be created");

    let content = std::fs::read_to_string(&rules_path).unwrap();
    assert!(content.starts_with("# wikiwrap rules"));
    assert!(content.contains("[policy]"));
    assert!(content.contains("[[group]]"));
    assert!(content.contains("eMail"));
}

#[test]
fn init_with_custom_output_path() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir)
        .arg("init")
        .arg("--output")
        .arg("custom/path/rules.toml");

    cmd.assert().success();

    let rules_path = dir.join("custom/path/rules.toml");
    assert!(rules_path.exists(), "rules should be created at custom path");
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let rules_path = dir.join("wikiwrap.toml");
    std::fs::write(&rules_path, "# existing rules\n").unwrap();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir).arg("init");
    cmd.write_stdin("n\n");

    let output = cmd.output().expect("run init");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Aborted"));

    let content = std::fs::read_to_string(&rules_path).unwrap();
    assert_eq!(content, "# existing rules\n", "file must not be overwritten");
}

#[test]
fn init_overwrites_with_force_flag() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let rules_path = dir.join("wikiwrap.toml");
    std::fs::write(&rules_path, "# existing rules\n").unwrap();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir).arg("init").arg("--force");

    cmd.assert().success();

    let content = std::fs::read_to_string(&rules_path).unwrap();
    assert!(content.contains("[[group]]"));
}

#[test]
fn init_generated_file_is_valid_toml() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir).arg("init");
    cmd.assert().success();

    let content = std::fs::read_to_string(dir.join("wikiwrap.toml")).unwrap();
    let parsed: RulesFile = toml::from_str(&content).expect("valid rules toml");
    assert_eq!(
        parsed.rule_set().rule_count(),
        RulesFile::built_in().rule_set().rule_count()
    );
}

#[test]
fn init_short_flags_work() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir).arg("init").arg("-o").arg("notes.toml").arg("-f");

    cmd.assert().success();
    assert!(dir.join("notes.toml").exists());
}

#[test]
fn init_prints_helpful_message() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    let mut cmd = wikiwrap_cmd();
    cmd.current_dir(dir).arg("init");

    let output = cmd.output().expect("run init");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("Created"), "should confirm creation");
    assert!(stdout.contains("Next steps"), "should show next steps");
    assert!(
        stdout.contains("wikiwrap annotate"),
        "should mention the annotate command"
    );
}

#[test]
fn annotate_picks_up_the_initialized_file() {
    let td = TempDir::new().expect("temp");
    let dir = td.path();

    wikiwrap_cmd().current_dir(dir).arg("init").assert().success();

    // Narrow the initialized file down to a single custom rule; annotate
    // must honor it over the built-in library.
    std::fs::write(
        dir.join("wikiwrap.toml"),
        r#"
[[rule]]
name = "Ticket"
pattern = '\b(TICKET-\d+)\b'
"#,
    )
    .unwrap();
    std::fs::write(dir.join("a.md"), "mail bob@example.com about TICKET-42").unwrap();

    wikiwrap_cmd()
        .current_dir(dir)
        .arg("annotate")
        .arg("--write")
        .arg("a.md")
        .assert()
        .success();

    let content = std::fs::read_to_string(dir.join("a.md")).unwrap();
    assert_eq!(content, "mail bob@example.com about [[TICKET-42]]");
}
