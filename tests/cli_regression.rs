// CLI regression tests: render/check round trips and miette-rendered failures.
// Requires: assert_cmd, predicates, tempfile crates in [dev-dependencies]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use sheetforge::document::{Row, Workbook};

fn write_template(path: &Path, rows: &[&str]) {
    let mut wb = Workbook::new();
    let sheet = wb.add_sheet("Staff");
    for value in rows {
        sheet.push_row(Row::from_values([*value]));
    }
    wb.save(path).unwrap();
}

#[test]
fn cli_renders_template_with_yaml_data() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.json");
    let data = dir.path().join("data.yaml");
    let output = dir.path().join("report.json");

    write_template(&template, &["{{range employees}}", "{{name}}", "{{end}}"]);
    fs::write(&data, "employees:\n  - name: Ann\n  - name: Bo\n").unwrap();

    let mut cmd = Command::cargo_bin("sheetforge").unwrap();
    cmd.arg("render")
        .arg(&template)
        .arg("--data")
        .arg(&data)
        .arg("--output")
        .arg(&output);
    cmd.assert()
        .success()
        .stdout(contains("Rendered 1 sheet(s), 2 row(s)"));

    let report = Workbook::open(&output).unwrap();
    assert_eq!(report.sheets[0].values(), vec![vec!["Ann"], vec!["Bo"]]);
}

#[test]
fn cli_wrap_text_flag_sets_cell_wrapping() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.json");
    let data = dir.path().join("data.json");
    let output = dir.path().join("report.json");

    write_template(&template, &["{{title}}"]);
    fs::write(&data, r#"{"title": "Wrapped"}"#).unwrap();

    Command::cargo_bin("sheetforge")
        .unwrap()
        .args(["render", "--wrap-text", "--data"])
        .arg(&data)
        .arg("--output")
        .arg(&output)
        .arg(&template)
        .assert()
        .success();

    let report = Workbook::open(&output).unwrap();
    let cell = &report.sheets[0].rows[0].cells[0];
    assert_eq!(cell.value, "Wrapped");
    assert!(cell.style.alignment.wrap_text);
}

#[test]
fn cli_reports_miette_diagnostics_on_unclosed_range() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template.json");
    let data = dir.path().join("data.json");
    let output = dir.path().join("report.json");

    write_template(&template, &["{{range employees}}", "{{name}}"]);
    fs::write(&data, r#"{"employees": []}"#).unwrap();

    let mut cmd = Command::cargo_bin("sheetforge").unwrap();
    cmd.arg("render")
        .arg(&template)
        .arg("--data")
        .arg(&data)
        .arg("--output")
        .arg(&output);
    cmd.assert().failure().stderr(
        contains("sheetforge::range_not_closed").or(contains("End of range")),
    );
    assert!(!output.exists());
}

#[test]
fn cli_check_accepts_balanced_and_rejects_unclosed() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    let bad = dir.path().join("bad.json");

    write_template(&good, &["{{range a}}", "{{range b}}", "{{end}}", "{{end}}"]);
    write_template(&bad, &["{{range a}}", "{{range b}}", "{{end}}"]);

    Command::cargo_bin("sheetforge")
        .unwrap()
        .arg("check")
        .arg(&good)
        .assert()
        .success()
        .stdout(contains("all ranges closed"));

    Command::cargo_bin("sheetforge")
        .unwrap()
        .arg("check")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(contains("\"a\"").and(contains("Staff!A1")));
}
