use crate::common::test_dir;
use course_mark::{
    config::Config,
    lint::{Linter, Severity},
    report::Report,
};
use std::path::{Path, PathBuf};

mod common;

fn run(config: Config) -> Report {
    Linter::with_config(test_dir(), config)
        .expect("failed to load content")
        .run()
        .expect("failed to run rules")
}

fn default_run() -> Report {
    run(Config::load_or_default(test_dir()).expect("failed to load configuration"))
}

fn found(report: &Report) -> Vec<(&str, Severity, &Path)> {
    report
        .diagnostics
        .iter()
        .map(|diagnostic| {
            (
                diagnostic.rule.as_str(),
                diagnostic.severity,
                diagnostic.path.as_path(),
            )
        })
        .collect()
}

#[test]
fn it_accepts_a_well_formed_course() {
    let report = default_run();

    assert!(report
        .diagnostics
        .iter()
        .all(|diagnostic| !diagnostic.path.starts_with("go")));
}

#[test]
fn it_reports_every_problem_of_a_broken_course() {
    let report = default_run();
    let lesson = Path::new("rust/rust-ownership/01-moves/01-moves.md");
    let readme = Path::new("rust/rust-ownership/README.md");
    let stray = Path::new("rust/rust-ownership/notes.md");

    assert_eq!(
        vec![
            ("attribution-footer", Severity::Error, lesson),
            ("front-matter", Severity::Error, lesson),
            ("required-sections", Severity::Warning, lesson),
            ("code-language", Severity::Warning, lesson),
            ("lesson-count", Severity::Error, readme),
            ("readme-links", Severity::Error, readme),
            ("naming", Severity::Warning, stray),
        ],
        found(&report)
    );
    assert_eq!(4, report.errors);
    assert_eq!(3, report.warnings);
    assert!(report.has_failures(false));
}

#[test]
fn it_points_at_the_broken_link() {
    let report = default_run();

    let link = report
        .diagnostics
        .iter()
        .find(|diagnostic| diagnostic.rule == "readme-links")
        .expect("broken link is reported");

    assert_eq!(
        "link `02-borrowing/README.md` points to a missing file",
        link.message
    );
    assert_eq!(Some(6), link.position.map(|position| position.line));
}

#[test]
fn it_honors_disabled_rules_and_severity_overrides() {
    let mut config = Config::load_or_default(test_dir()).expect("failed to load configuration");
    config.lint.disabled = vec![
        String::from("attribution-footer"),
        String::from("readme-links"),
        String::from("lesson-count"),
    ];
    config
        .lint
        .severity
        .insert(String::from("front-matter"), Severity::Warning);

    let report = run(config);

    assert_eq!(0, report.errors);
    assert_eq!(4, report.warnings);
    assert!(!report.has_failures(false));
    assert!(report.has_failures(true));
}

#[test]
fn it_renders_the_report_as_json() {
    let report = default_run();
    let mut buffer = Vec::new();
    report.render_json(&mut buffer).expect("renders");

    let value: serde_json::Value = serde_json::from_slice(&buffer).expect("valid json");

    assert_eq!(serde_json::json!(4), value["errors"]);
    assert_eq!(
        serde_json::json!(PathBuf::from("rust/rust-ownership/01-moves/01-moves.md")),
        value["diagnostics"][0]["path"]
    );
}
