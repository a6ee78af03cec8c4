//! Integration tests for the analysis engine
//!
//! These tests run the full analyzer over in-memory baselines built by the
//! fixtures module and over baselines written to and read back from disk.

mod fixtures;

use apicheck_baseline::{load, save_to_file};
use apicheck_core::{Config, ProblemCategory, ProblemKind, Severity, Version};
use apicheck_engine::{ApiAnalyzer, FilterStore, ProblemFilter};
use pretty_assertions::assert_eq;
use std::fs;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compatibility_only() -> Config {
    let mut config = Config::default();
    config.analysis.check_versions = false;
    config
}

// =============================================================================
// Compatibility
// =============================================================================

#[test]
fn test_removed_methods_follow_reference_restrictions() -> anyhow::Result<()> {
    init_tracing();
    let reference = fixtures::removal_reference();
    let current = fixtures::removal_current(Version::new(1, 0, 0));

    let result = ApiAnalyzer::new(compatibility_only()).analyze(&reference, &current, None)?;

    let mut removed: Vec<(String, String)> = result
        .report
        .problems_in(ProblemCategory::Compatibility)
        .map(|p| {
            let type_name = p.type_name.clone().unwrap_or_default();
            let simple = type_name.rsplit('.').next().unwrap_or_default().to_string();
            (simple, p.member.clone().unwrap_or_default())
        })
        .collect();
    removed.sort();

    let expected: Vec<(String, String)> = [
        ("NoExtend", "publicMethod(String)"),
        ("NoExtendNoInstantiate", "publicMethod(String)"),
        ("NoInstantiate", "protectedMethod(String)"),
        ("NoInstantiate", "publicMethod(String)"),
        ("NoOverrideMethods", "protectedMethod(String)"),
        ("NoOverrideMethods", "publicMethod(String)"),
        ("Plain", "protectedMethod(String)"),
        ("Plain", "publicMethod(String)"),
    ]
    .iter()
    .map(|(t, m)| (t.to_string(), m.to_string()))
    .collect();

    assert_eq!(removed, expected);
    Ok(())
}

#[test]
fn test_removed_method_problem_shape() -> anyhow::Result<()> {
    let reference = fixtures::removal_reference();
    let current = fixtures::removal_current(Version::new(1, 0, 0));

    let result = ApiAnalyzer::new(compatibility_only()).analyze(&reference, &current, None)?;
    let plain = fixtures::qualified("Plain");
    let problem = result
        .report
        .problems
        .iter()
        .find(|p| p.type_name.as_deref() == Some(plain.as_str()) && p.member.as_deref() == Some("publicMethod(String)"))
        .ok_or_else(|| anyhow::anyhow!("missing problem for Plain.publicMethod"))?;

    assert_eq!(problem.id(), "COMPATIBILITY.CLASS.REMOVED.METHOD");
    assert_eq!(problem.kind, ProblemKind::Removed);
    assert_eq!(problem.severity, Severity::Error);
    assert_eq!(problem.message_args, vec![plain.clone(), "publicMethod(String)".to_string()]);
    assert_eq!(
        problem.message,
        format!("The method {}.publicMethod(String) has been removed", plain)
    );
    Ok(())
}

#[test]
fn test_version_problems_and_major_increment() -> anyhow::Result<()> {
    let reference = fixtures::removal_reference();

    let unchanged = fixtures::removal_current(Version::new(1, 0, 0));
    let result = ApiAnalyzer::new(Config::default()).analyze(&reference, &unchanged, None)?;
    let version: Vec<ProblemKind> = result
        .report
        .problems_in(ProblemCategory::Version)
        .map(|p| p.kind)
        .collect();
    assert_eq!(version, vec![ProblemKind::MajorVersionChange]);

    let bumped = fixtures::removal_current(Version::new(2, 0, 0));
    let result = ApiAnalyzer::new(Config::default()).analyze(&reference, &bumped, None)?;
    assert_eq!(result.report.summary.total, 0);
    assert!(!result.deltas.is_empty());

    let mut config = Config::default();
    config.analysis.report_breakage_on_major_increment = true;
    let result = ApiAnalyzer::new(config).analyze(&reference, &bumped, None)?;
    assert_eq!(result.report.summary.compatibility, 8);
    Ok(())
}

// =============================================================================
// Usage and tags
// =============================================================================

#[test]
fn test_indirect_illegal_implement() -> anyhow::Result<()> {
    init_tracing();
    let baseline = fixtures::indirect_implement();

    let result = ApiAnalyzer::new(Config::default()).analyze(&baseline, &baseline, None)?;
    let usage: Vec<_> = result.report.problems_in(ProblemCategory::Usage).collect();

    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].kind, ProblemKind::IndirectIllegalImplement);
    assert_eq!(usage[0].component_id, fixtures::CLIENT);
    assert_eq!(
        usage[0].message_args,
        vec![
            fixtures::qualified("INoImpl"),
            "org.example.client.ILocal".to_string(),
            "org.example.client.Impl".to_string(),
        ]
    );
    assert!(result.deltas.is_empty());
    Ok(())
}

#[test]
fn test_usage_check_can_be_disabled() -> anyhow::Result<()> {
    let baseline = fixtures::indirect_implement();
    let mut config = Config::default();
    config.analysis.check_usage = false;

    let result = ApiAnalyzer::new(config).analyze(&baseline, &baseline, None)?;
    assert_eq!(result.report.summary.usage, 0);
    Ok(())
}

// =============================================================================
// Configuration and filters on disk
// =============================================================================

#[test]
fn test_config_file_with_filters() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("apicheck.toml"),
        r#"
filters = "api_filters.toml"

[severity.overrides]
"COMPATIBILITY.CLASS.REMOVED.METHOD" = "warn"
version = "ignore"
"#,
    )?;

    let plain = fixtures::qualified("Plain");
    let mut store = FilterStore::new();
    store.add_filter(
        ProblemFilter::new(fixtures::API, "COMPATIBILITY.CLASS.REMOVED.METHOD")
            .with_type(&plain)
            .with_comment("accepted removal"),
    );
    store.add_filter(ProblemFilter::new(fixtures::API, "USAGE.*").with_type(&plain));
    store.save_to_file(&dir.path().join("api_filters.toml"))?;

    let config = Config::from_file(&dir.path().join("apicheck.toml"))?;
    let analyzer = ApiAnalyzer::new(config);
    let mut filters = analyzer
        .load_filters()?
        .ok_or_else(|| anyhow::anyhow!("filters not configured"))?;
    assert_eq!(filters.len(), 2);

    let reference = fixtures::removal_reference();
    let current = fixtures::removal_current(Version::new(1, 0, 0));
    let result = analyzer.analyze(&reference, &current, Some(&mut filters))?;

    assert_eq!(result.report.summary.filtered, 2);
    assert_eq!(result.report.summary.total, 6);
    assert_eq!(result.report.summary.warnings, 6);
    assert!(!result.report.has_errors());
    assert_eq!(result.unused_filters.len(), 1);
    assert_eq!(result.unused_filters[0].id, "USAGE.*");
    Ok(())
}

#[test]
fn test_reloaded_baselines_give_same_report() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let reference_path = dir.path().join("reference.json");
    let current_path = dir.path().join("current.json");

    let reference = fixtures::removal_reference();
    let current = fixtures::removal_current(Version::new(1, 1, 0));
    save_to_file(&reference, &reference_path)?;
    save_to_file(&current, &current_path)?;

    let analyzer = ApiAnalyzer::new(Config::default());
    let in_memory = analyzer.analyze(&reference, &current, None)?;
    let reloaded = analyzer.analyze(&load(&reference_path)?, &load(&current_path)?, None)?;

    assert_eq!(reloaded.report.problems, in_memory.report.problems);
    assert_eq!(reloaded.report.metadata, in_memory.report.metadata);

    let json = reloaded.report.to_json()?;
    assert!(json.contains("COMPATIBILITY"));
    let markdown = reloaded.report.to_markdown();
    assert!(markdown.contains(&format!("## {}", fixtures::API)));
    Ok(())
}
