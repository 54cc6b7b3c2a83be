//! CLI tests: spawn the staticpilot binary and check exit codes and output.

use std::process::Command;

use staticpilot::exit_codes;
use staticpilot::io::config::{ENV_API_KEY, ENV_API_URL};
use staticpilot::test_support::TestProject;

fn staticpilot() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_staticpilot"));
    cmd.env_remove(ENV_API_KEY)
        .env_remove(ENV_API_URL)
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn run_without_credentials_exits_with_config_code() {
    let project = TestProject::new();
    project.write("task/site.zip", "");

    let output = staticpilot()
        .current_dir(project.path())
        .arg("run")
        .arg("--root")
        .arg(project.path())
        .output()
        .expect("staticpilot run");

    assert_eq!(output.status.code(), Some(exit_codes::CONFIG));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing OPENAI_API_KEY"));
    assert!(!project.path().join("source").exists());
}

#[test]
fn locate_prints_selected_directory() {
    let project = TestProject::new();
    project.write("dist/index.html", "<html></html>");

    let output = staticpilot()
        .arg("locate")
        .arg(project.path())
        .output()
        .expect("staticpilot locate");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        project.path().join("dist").display().to_string()
    );
}

#[test]
fn locate_without_candidates_fails() {
    let project = TestProject::new();
    project.write("src/main.ts", "");

    let status = staticpilot()
        .arg("locate")
        .arg(project.path())
        .status()
        .expect("staticpilot locate");

    assert_eq!(status.code(), Some(exit_codes::FAILED));
}
