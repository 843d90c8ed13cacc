//! End-to-end runs of the pipeline on small panel datasets.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::TempDir;

use dpoll_cli::pipeline::{
    PipelineError, aggregate, assemble_tables, check, ingest, output_dir_for, outputs,
    outputs_with_progress, reshape_survey, validate,
};
use dpoll_cli::types::AggregationProgress;
use dpoll_model::{Code, ComparisonKind, ComparisonTable, Metadata, Statistic};
use dpoll_report::{
    ALL_RESPONDENTS, AssembledTable, CHI_SQUARE_ROW, MEAN_ROW, OutputFormat, OutputKind,
    UNWEIGHTED_N_ROW, planned_formats,
};
use dpoll_validate::Issue;

fn codebook(with_gender: bool) -> String {
    let mut text = String::from(
        r#"
[codebook]
schema = "dpoll.codebook"
schema_version = 1

[analysis]
include_unweighted = false

[[variables]]
name = "IDs"
label = "Respondent"
measure = "scale"

[[variables]]
name = "Time"
label = "Wave"
measure = "scale"

[[variables]]
name = "Group"
label = "Arm"
measure = "scale"

[[variables]]
name = "weight"
label = "Design weight"
measure = "scale"

[[variables]]
name = "Q1"
label = "Support"
measure = "ordinal"

[variables.value_labels]
0 = "Strongly oppose"
1 = "1"
2 = "2"
3 = "3"
4 = "4"
5 = "5"
6 = "6"
7 = "7"
8 = "8"
9 = "9"
10 = "Strongly support"
"#,
    );
    if with_gender {
        text.push_str(
            r#"
[[variables]]
name = "Gender"
label = "Gender"
measure = "nominal"

[variables.value_labels]
1 = "Male"
2 = "Female"
"#,
        );
    }
    text
}

/// (id, time, group, Q1, gender)
const ROWS: [(u32, &str, &str, u32, u32); 12] = [
    (1, "T1", "Treatment", 3, 1),
    (1, "T2", "Treatment", 5, 1),
    (2, "T1", "Treatment", 4, 2),
    (2, "T2", "Treatment", 7, 2),
    (3, "T1", "Treatment", 6, 2),
    (3, "T2", "Treatment", 8, 2),
    (4, "T1", "Control", 5, 1),
    (4, "T2", "Control", 5, 1),
    (5, "T1", "Control", 2, 2),
    (5, "T2", "Control", 3, 2),
    (6, "T1", "Control", 7, 2),
    (6, "T2", "Control", 6, 2),
];

fn csv(with_gender: bool, override_q1: Option<(u32, &str, u32)>) -> String {
    csv_with_times(with_gender, override_q1, ("T1", "T2"))
}

/// Like [`csv`], writing the two time labels as given.
fn csv_with_times(
    with_gender: bool,
    override_q1: Option<(u32, &str, u32)>,
    (first, second): (&str, &str),
) -> String {
    let mut out = String::from("IDs,Time,Group,weight,Q1");
    if with_gender {
        out.push_str(",Gender");
    }
    out.push('\n');
    for (id, time, group, q1, gender) in ROWS {
        let q1 = match override_q1 {
            Some((o_id, o_time, value)) if o_id == id && o_time == time => value,
            _ => q1,
        };
        let label = if time == "T1" { first } else { second };
        out.push_str(&format!("{id},{label},{group},1,{q1}"));
        if with_gender {
            out.push_str(&format!(",{gender}"));
        }
        out.push('\n');
    }
    out
}

fn write_dataset(dir: &Path, with_gender: bool, override_q1: Option<(u32, &str, u32)>) -> PathBuf {
    let data = dir.join("poll.csv");
    fs::write(&data, csv(with_gender, override_q1)).unwrap();
    fs::write(dir.join("poll.codebook.toml"), codebook(with_gender)).unwrap();
    data
}

/// Runs every stage up to aggregation without writing files.
fn tables_for(path: &Path) -> (Metadata, Vec<ComparisonTable>, Vec<AssembledTable>) {
    let loaded = ingest(path).unwrap();
    let report_dir = path.parent().unwrap();
    validate(&loaded.survey, &loaded.options, report_dir).unwrap();
    let metadata = Metadata::new(loaded.survey.variables.clone()).unwrap();
    let reshaped = reshape_survey(&loaded.survey, &metadata).unwrap();
    let tables = aggregate(&reshaped, &metadata, &loaded.options, |_| {}).unwrap();
    let set = assemble_tables(&tables, &metadata, &loaded.options);
    (metadata, tables.comparisons, set.tables)
}

fn mean(stats: Statistic) -> f64 {
    stats.value().unwrap()
}

#[test]
fn single_table_for_two_times_and_two_groups() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), false, None);

    let (_, tables, assembled) = tables_for(&path);
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.cells.len(), 4);
    for cell in &table.cells {
        assert!(cell.all.mean.is_defined());
        assert_eq!(cell.all.unweighted_n, 3);
        assert_eq!(cell.all.distribution.len(), 11);
    }
    let treatment = Code::from(1);
    let control = Code::from(2);
    let t1 = Code::from(1);
    let t2 = Code::from(2);
    assert!((mean(table.cell(treatment, t1).unwrap().all.mean) - 13.0 / 3.0).abs() < 1e-12);
    assert!((mean(table.cell(treatment, t2).unwrap().all.mean) - 20.0 / 3.0).abs() < 1e-12);
    assert!((mean(table.cell(control, t2).unwrap().all.mean) - 14.0 / 3.0).abs() < 1e-12);

    let paired = table
        .comparisons
        .iter()
        .filter(|c| matches!(c.kind, ComparisonKind::Paired { .. }))
        .count();
    let between = table
        .comparisons
        .iter()
        .filter(|c| matches!(c.kind, ComparisonKind::Between { .. }))
        .count();
    assert_eq!((paired, between), (2, 2));
    assert!(table.comparisons.iter().all(|c| c.all.test.is_some()));

    let sheet = &assembled[0];
    assert_eq!(sheet.title, "Support - All respondents (Design weight)");
    insta::assert_snapshot!(sheet.columns.join("\n"), @r"
    Treatment at T1
    Treatment at T2
    Control at T1
    Control at T2
    Treatment at T1 v. T2
    Control at T1 v. T2
    Treatment v. Control at T1
    Treatment v. Control at T2
    ");
    let means: Vec<String> = sheet
        .row(ALL_RESPONDENTS, MEAN_ROW)
        .unwrap()
        .values
        .iter()
        .take(4)
        .map(ToString::to_string)
        .collect();
    assert_eq!(means, vec!["4.333", "6.667", "4.667", "4.667"]);
    assert_eq!(sheet.row(ALL_RESPONDENTS, "3").unwrap().values[0].to_string(), "33.3%");
    assert_eq!(
        sheet.row(ALL_RESPONDENTS, "Strongly oppose").unwrap().values[0].to_string(),
        "0.0%"
    );
}

#[test]
fn text_times_keep_their_order_of_appearance() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("poll.csv");
    fs::write(&data, csv_with_times(false, None, ("Pre", "Baseline"))).unwrap();
    fs::write(dir.path().join("poll.codebook.toml"), codebook(false)).unwrap();

    let (metadata, tables, assembled) = tables_for(&data);
    assert_eq!(metadata.label_for("Time", Code::from(1)), "Pre");
    assert_eq!(metadata.label_for("Time", Code::from(2)), "Baseline");

    // "Pre" rows come first, so it stays the baseline despite sorting later.
    let treatment_pre = tables[0].cell(Code::from(1), Code::from(1)).unwrap();
    assert!((mean(treatment_pre.all.mean) - 13.0 / 3.0).abs() < 1e-12);
    insta::assert_snapshot!(assembled[0].columns.join("\n"), @r"
    Treatment at Pre
    Treatment at Baseline
    Control at Pre
    Control at Baseline
    Treatment at Pre v. Baseline
    Control at Pre v. Baseline
    Treatment v. Control at Pre
    Treatment v. Control at Baseline
    ");
}

#[test]
fn outputs_writes_files_and_manifest() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), false, None);

    let summary = outputs(&path).unwrap();
    assert_eq!(summary.dataset, "poll");
    assert_eq!(summary.rows, 12);
    assert_eq!(summary.units, 6);
    assert_eq!(summary.tables, 1);
    assert!(summary.validation.is_empty());

    let out = dir.path().join("Outputs").join("poll");
    assert_eq!(summary.outputs.dir, out);
    assert_eq!(output_dir_for(&path), out);
    assert_eq!(summary.outputs.manifest.count(OutputFormat::Xlsx), 1);
    assert_eq!(summary.outputs.manifest.count(OutputFormat::Docx), 2);
    assert_eq!(summary.outputs.manifest.count_kind(OutputKind::Report), 1);
    assert!(out.join("Tables - Support - All respondents (Design weight).xlsx").exists());
    assert!(out.join("Tables - Support - All respondents (Design weight).docx").exists());
    assert!(out.join("Report - All respondents (Design weight).docx").exists());
    assert!(out.join("manifest.json").exists());
    assert!(!dir.path().join("poll.validation.json").exists());
}

#[test]
fn unlabeled_code_stops_the_run_before_any_table() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), false, Some((2, "T2", 99)));

    let err = outputs(&path).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @r"
    validation of 'poll' failed with 1 error:
      1. Variable Q1 has unlabeled codes: 99
    ");
    let report = err.validation_report().unwrap();
    assert_eq!(
        report.errors().collect::<Vec<_>>(),
        vec![&Issue::UnlabeledValue {
            variable: "Q1".to_string(),
            codes: vec![Code::from(99)],
        }]
    );
    assert!(!dir.path().join("Outputs").exists());

    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("poll.validation.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["error_count"], 1);
    assert_eq!(json["issues"][0]["variable"], "Q1");
}

#[test]
fn breakdown_splits_every_cell_by_category() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), true, None);

    let (metadata, tables, assembled) = tables_for(&path);
    assert_eq!(tables.len(), 2);
    let by_gender = tables.iter().find(|t| t.has_breakdown()).unwrap();
    let male = Code::from(1);
    let female = Code::from(2);
    assert_eq!(metadata.label_for("Gender", male), "Male");

    assert_eq!(by_gender.cells.len(), 4);
    for cell in &by_gender.cells {
        assert_eq!(cell.categories.len(), 2);
        let sizes: usize = cell.categories.iter().map(|(_, s)| s.unweighted_n).sum();
        assert_eq!(sizes, cell.all.unweighted_n);
        assert_eq!(cell.category(male).unwrap().unweighted_n, 1);
        assert_eq!(cell.category(female).unwrap().unweighted_n, 2);
    }
    let treatment_t1 = by_gender.cell(Code::from(1), Code::from(1)).unwrap();
    assert!((mean(treatment_t1.category(male).unwrap().mean) - 3.0).abs() < 1e-12);
    assert!((mean(treatment_t1.category(female).unwrap().mean) - 5.0).abs() < 1e-12);

    let sheet = assembled
        .iter()
        .find(|t| t.title == "Support - Gender (Design weight)")
        .unwrap();
    let male_sizes: Vec<String> = sheet
        .row("Male", UNWEIGHTED_N_ROW)
        .unwrap()
        .values
        .iter()
        .take(4)
        .map(ToString::to_string)
        .collect();
    assert_eq!(male_sizes, vec!["1", "1", "1", "1"]);
    assert!(sheet.row(ALL_RESPONDENTS, "Association with Gender").is_some());

    let distribution = assembled
        .iter()
        .find(|t| t.title == "Gender - Distribution (Design weight)")
        .unwrap();
    let male: Vec<String> = distribution
        .row(ALL_RESPONDENTS, "Male")
        .unwrap()
        .values
        .iter()
        .take(4)
        .map(ToString::to_string)
        .collect();
    assert_eq!(male, vec!["33.3% (1)"; 4]);
    assert!(distribution.row(ALL_RESPONDENTS, CHI_SQUARE_ROW).is_some());
}

#[test]
fn breakdown_tables_are_written_per_combination() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), true, None);

    let summary = outputs(&path).unwrap();
    assert_eq!(summary.tables, 3);
    // Three tables in both formats plus one report per breakdown.
    assert_eq!(summary.outputs.manifest.files.len(), 8);
    assert_eq!(summary.outputs.manifest.count_kind(OutputKind::Report), 2);
    let out = &summary.outputs.dir;
    assert!(out.join("Tables - Support - Gender (Design weight).xlsx").exists());
    assert!(out.join("Tables - Gender - Distribution (Design weight).xlsx").exists());
    assert!(out.join("Report - Gender (Design weight).docx").exists());
}

#[test]
fn large_tables_are_spreadsheet_only() {
    assert_eq!(planned_formats(60_000), vec![OutputFormat::Xlsx]);
    assert_eq!(planned_formats(49_999), vec![OutputFormat::Xlsx, OutputFormat::Docx]);
}

#[test]
fn progress_reaches_the_planned_total() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), true, None);

    let seen = Mutex::new(Vec::new());
    outputs_with_progress(&path, |progress: AggregationProgress| {
        seen.lock().unwrap().push(progress);
    })
    .unwrap();
    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.first().map(|p| p.completed), Some(0));
    // Two comparison tables and one distribution.
    assert_eq!(seen.iter().map(|p| p.completed).max(), Some(3));
    assert!(seen.iter().all(|p| p.total == 3));
}

#[test]
fn check_always_writes_the_report() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), false, Some((2, "T2", 99)));

    let summary = check(&path).unwrap();
    assert!(summary.report.has_errors());
    assert_eq!(summary.report_path, dir.path().join("poll.validation.json"));
    assert!(summary.report_path.exists());
    assert!(!dir.path().join("Outputs").exists());

    let clean = TempDir::new().unwrap();
    let path = write_dataset(clean.path(), false, None);
    let summary = check(&path).unwrap();
    assert!(summary.report.is_empty());
    assert!(summary.report_path.exists());
}

#[test]
fn missing_codebook_is_an_ingest_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("poll.csv");
    fs::write(&path, csv(false, None)).unwrap();

    let err = outputs(&path).unwrap_err();
    assert!(matches!(err, PipelineError::Ingest(_)));
    assert!(err.validation_report().is_none());
}
