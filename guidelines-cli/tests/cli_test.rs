//! Integration tests for the bids-guidelines binary

use anyhow::Result;
use guidelines_core::catalog::GuidelineCatalog;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with an isolated user configuration directory
fn run(args: &[&str]) -> Output {
    let config_home = TempDir::new().expect("create config home");
    Command::new(env!("CARGO_BIN_EXE_bids-guidelines"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run bids-guidelines")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Two tasks, only one with instructions
fn write_dataset(root: &Path) {
    write(root, "dataset_description.json", r#"{"Name": "cli", "BIDSVersion": "1.9.0"}"#);
    write(root, "sub-01/func/sub-01_task-rest_bold.nii.gz", "");
    write(
        root,
        "sub-01/func/sub-01_task-rest_bold.json",
        r#"{"TaskName": "rest", "Instructions": "Eyes open"}"#,
    );
    write(root, "sub-01/func/sub-01_task-nback_bold.nii.gz", "");
    write(root, "sub-01/func/sub-01_task-nback_bold.json", r#"{"TaskName": "nback"}"#);
}

fn dataset() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());
    dir
}

#[test]
fn test_text_report() {
    let ds = dataset();
    let path = ds.path().to_str().unwrap();

    let output = run(&[path]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        format!("Using COBIDAS guidelines to check BIDS dataset: {path}")
    );
    assert!(out.contains(
        "D01.05.02.00.00.01: 1/2 (50 %) Experimental Design Reporting | Task | Instructions"
    ));
    assert!(out.contains("D01.04.01.00.00.01: 2/2 (100 %)"));
    assert!(out.contains("applicable guidelines, dataset score:"));
    assert_eq!(
        lines.last().copied(),
        Some(format!("Finished using COBIDAS guidelines to check BIDS dataset: {path}").as_str())
    );
    // not-applicable rules are not listed
    assert!(!out.contains("D02.06.01.00.00.01"));
}

#[test]
fn test_json_report() -> Result<()> {
    let ds = dataset();

    let output = run(&["--json", ds.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let report: Value = serde_json::from_str(&stdout(&output))?;
    assert_eq!(report["standard"], "COBIDAS");

    let instructions = report["rules"]
        .as_array()
        .and_then(|rules| rules.iter().find(|r| r["id"] == "D01.05.02.00.00.01"))
        .cloned()
        .expect("instructions rule is applicable");
    assert_eq!(instructions["tally"], 1);
    assert_eq!(instructions["total"], 2);
    assert_eq!(instructions["status"], "partial_success");
    assert_eq!(instructions["percent"], 50);

    let not_applicable: Vec<&str> = report["not_applicable"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    assert!(not_applicable.contains(&"D02.06.01.00.00.01"));
    assert!(not_applicable.contains(&"D02.04.01.00.00.01"));

    Ok(())
}

#[test]
fn test_lowercase_standard_is_accepted() {
    let ds = dataset();
    let output = run(&["-g", "cobidas", ds.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn test_unimplemented_standard_fails() {
    let ds = dataset();

    for standard in ["CLAIM", "CRED-nf"] {
        let output = run(&["--guidelines", standard, ds.path().to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(1));
        assert!(
            stderr(&output).contains(&format!("{standard} guidelines are not yet implemented.")),
            "stderr: {}",
            stderr(&output)
        );
        assert!(stdout(&output).is_empty());
    }
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let output = run(&[missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(&format!(
        "The specified BIDS directory '{}' does not exist.",
        missing.display()
    )));
}

#[test]
fn test_file_instead_of_directory_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("dataset.txt");
    fs::write(&file, "not a dataset").unwrap();

    let output = run(&[file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("is not a directory"));
}

#[test]
fn test_missing_catalog_fails() {
    let ds = dataset();
    let output = run(&["--catalog", "/nonexistent/catalog.yaml", ds.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_config_file_selects_standard() {
    let ds = dataset();
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("config.yml");
    fs::write(&config, "standard: CLAIM\n").unwrap();

    let output = run(&["--config", config.to_str().unwrap(), ds.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("CLAIM guidelines are not yet implemented."));

    // command-line standard wins over the file
    let output = run(&[
        "--config",
        config.to_str().unwrap(),
        "-g",
        "COBIDAS",
        ds.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn test_batch_mode_skips_non_datasets() {
    let root = TempDir::new().unwrap();
    write_dataset(&root.path().join("ds001"));
    write_dataset(&root.path().join("ds002"));
    write_dataset(&root.path().join("docs"));
    write_dataset(&root.path().join(".git"));
    write(root.path(), "README", "collection of datasets");

    let output = run(&["--batch", root.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert_eq!(out.matches("Using COBIDAS guidelines").count(), 2);
    assert!(out.contains("ds001"));
    assert!(out.contains("ds002"));
    assert!(!out.contains("docs"));
}

#[test]
fn test_batch_json_is_an_array() -> Result<()> {
    let root = TempDir::new().unwrap();
    write_dataset(&root.path().join("ds001"));

    let output = run(&["--batch", "--json", root.path().to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let reports: Value = serde_json::from_str(&stdout(&output))?;
    assert_eq!(reports.as_array().map(Vec::len), Some(1));

    Ok(())
}

#[test]
fn test_rules_subcommand() {
    let output = run(&["rules"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.contains("COBIDAS rules"));
    assert!(out.contains("D01.05.02.00.00.01"));
    assert!(out.contains("D02.06.06.00.00.01"));
}

#[test]
fn test_rules_subcommand_rejects_unimplemented_standard() {
    let output = run(&["rules", "-g", "CLAIM"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_convert_subcommand() -> Result<()> {
    let dir = TempDir::new()?;
    let input = dir.path().join("cobidas.tsv");
    let output_path = dir.path().join("catalog.yaml");
    fs::write(
        &input,
        "Reference\tTable\tTable.1\tAspect1\tAspect2\tAspect3\tAspect4\tDetail to specify if used/applicable\n\
         D01.01.01\tD\tExperimental Design Reporting\tSubjects\tNumber\t\t\tReport the number of subjects\n\
         D01.01.02\tD\tExperimental Design Reporting\tSubjects\tAge\t\t\tReport the age range\n",
    )?;

    let output = run(&[
        "convert",
        input.to_str().unwrap(),
        "-o",
        output_path.to_str().unwrap(),
        "--skip-rows",
        "0",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let catalog = GuidelineCatalog::load(&output_path)?;
    assert_eq!(catalog.len(), 2);
    assert_eq!(
        catalog.label("D01.01.01"),
        "Experimental Design Reporting | Subjects | Number"
    );

    Ok(())
}

#[test]
fn test_version_flag() {
    for flag in ["-v", "--version"] {
        let output = run(&[flag]);
        assert!(output.status.success());
        assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_directory_is_required() {
    let output = run(&[]);
    assert!(!output.status.success());
}
