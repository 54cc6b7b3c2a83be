//! End-to-end pipeline scenarios with scripted oracle and shell.
//!
//! The scripted shell materializes files the way real tools would (extraction
//! creates the project, `npm run build` creates `dist/`), so the locator and
//! publisher run against a real temporary tree.

use staticpilot::core::conversation::Role;
use staticpilot::core::rewrite::DEFAULT_REWRITE_RULES;
use staticpilot::error::{NoArtifactFound, StepBudgetExhausted};
use staticpilot::io::config::BuildConfig;
use staticpilot::io::release::REWRITE_RULES_FILE;
use staticpilot::pipeline::run_pipeline;
use staticpilot::test_support::{ScriptedOracle, ScriptedRun, ScriptedShell, TestProject};

const TOKEN: &str = "DONE";
const HISTORY_FALLBACK: &str =
    "location / {\n    try_files $uri $uri/ /index.html;\n}\nerror_page 404 /index.html;";

fn config(max_steps: u32) -> BuildConfig {
    BuildConfig {
        api_key: "sk-test".to_string(),
        api_url: "https://api.example.com/v1".to_string(),
        max_steps,
        completion_token: TOKEN.to_string(),
        ..BuildConfig::default()
    }
}

fn project_with_archive() -> TestProject {
    let project = TestProject::new();
    project.write("task/site.zip", "");
    project
}

fn extraction() -> ScriptedRun {
    ScriptedRun::ok("inflating: package.json")
        .with_file("package.json", "{\"name\":\"shop\",\"scripts\":{\"build\":\"vite build\"}}")
        .with_file("public/index.html", "<html>template</html>")
        .with_file("src/main.ts", "console.log('shop')")
}

/// Full run: extract → npm ci → npm run build → DONE → locate → publish → rewrite rules.
#[test]
fn full_run_publishes_fresh_build_output() {
    let project = project_with_archive();
    let cfg = config(10);
    let layout = cfg.layout(project.path());
    let oracle = ScriptedOracle::new(["npm ci", "```bash\nnpm run build\n```", TOKEN, HISTORY_FALLBACK]);
    let shell = ScriptedShell::new(vec![
        extraction(),
        ScriptedRun::ok("added 87 packages"),
        ScriptedRun::ok("built in 1.2s")
            .with_file("dist/index.html", "<html>fresh</html>")
            .with_file("dist/assets/app.js", "console.log('shop')"),
    ]);

    let outcome = run_pipeline(&cfg, &layout, &oracle, &shell).expect("pipeline");

    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.release_path, layout.release_dir.join("dist"));
    assert!(!outcome.rewrite_fallback);
    assert_eq!(project.read("release/dist/index.html"), "<html>fresh</html>");
    assert_eq!(project.read("release/dist/assets/app.js"), "console.log('shop')");
    assert!(!layout.source_dir.join("dist").exists());
    assert!(layout.source_dir.join("public/index.html").exists());
    assert_eq!(
        project.read(&format!("release/{REWRITE_RULES_FILE}")),
        format!("{HISTORY_FALLBACK}\n")
    );

    let calls = shell.calls();
    assert!(calls[0].command.starts_with("unzip -o "));
    assert_eq!(
        shell.commands()[1..].to_vec(),
        vec!["npm ci".to_string(), "npm run build".to_string()]
    );
    assert!(calls.iter().all(|call| call.workdir == layout.source_dir));

    // Three build-loop requests plus the standalone rewrite-rule request.
    let requests = oracle.calls();
    assert_eq!(requests.len(), 4);
    assert!(requests[0][1].content.contains("\"name\":\"shop\""));
    assert_eq!(requests[2].len(), 6);
    assert_eq!(requests[3].len(), 2);
    assert_eq!(requests[3][0].role, Role::System);
}

#[test]
fn invalid_rewrite_reply_falls_back_to_default() {
    let project = project_with_archive();
    let cfg = config(5);
    let layout = cfg.layout(project.path());
    let oracle = ScriptedOracle::new([
        "npm run build",
        TOKEN,
        "The first configuration is the right choice for a Vite app.",
    ]);
    let shell = ScriptedShell::new(vec![
        extraction(),
        ScriptedRun::ok("").with_file("build/index.html", "<html>spa</html>"),
    ]);

    let outcome = run_pipeline(&cfg, &layout, &oracle, &shell).expect("pipeline");

    assert!(outcome.rewrite_fallback);
    assert_eq!(
        project.read(&format!("release/{REWRITE_RULES_FILE}")),
        format!("{DEFAULT_REWRITE_RULES}\n")
    );
    assert_eq!(project.read("release/dist/index.html"), "<html>spa</html>");
}

#[test]
fn exhausted_budget_fails_before_publishing() {
    let project = project_with_archive();
    let cfg = config(2);
    let layout = cfg.layout(project.path());
    let oracle = ScriptedOracle::repeating("npm run build");
    let shell = ScriptedShell::new(vec![
        extraction(),
        ScriptedRun::failed(1, "vite: not found"),
        ScriptedRun::failed(1, "vite: not found"),
    ]);

    let err = run_pipeline(&cfg, &layout, &oracle, &shell).unwrap_err();

    assert_eq!(
        err.downcast_ref::<StepBudgetExhausted>(),
        Some(&StepBudgetExhausted { max_steps: 2 })
    );
    assert_eq!(oracle.call_count(), 2);
    assert!(!layout.release_dir.exists());
}

#[test]
fn missing_output_is_a_discovery_error() {
    let project = project_with_archive();
    let cfg = config(5);
    let layout = cfg.layout(project.path());
    let oracle = ScriptedOracle::new([TOKEN]);
    let shell = ScriptedShell::new(vec![
        ScriptedRun::ok("").with_file("src/main.ts", "console.log('no build')"),
    ]);

    let err = run_pipeline(&cfg, &layout, &oracle, &shell).unwrap_err();

    assert_eq!(
        err.downcast_ref::<NoArtifactFound>(),
        Some(&NoArtifactFound {
            root: layout.source_dir.clone()
        })
    );
    assert!(!layout.release_dir.exists());
}

#[test]
fn missing_task_directory_stops_before_oracle() {
    let project = TestProject::new();
    let cfg = config(5);
    let layout = cfg.layout(project.path());
    let oracle = ScriptedOracle::new([TOKEN]);
    let shell = ScriptedShell::new(Vec::new());

    let err = run_pipeline(&cfg, &layout, &oracle, &shell).unwrap_err();

    assert!(err.to_string().contains("task directory not found"));
    assert_eq!(oracle.call_count(), 0);
    assert!(shell.calls().is_empty());
}
