//! Tests for table assembly and the output writers.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

use dpoll_aggregate::{aggregate, aggregate_distribution};
use dpoll_model::{
    AnalysisOptions, Code, ComparisonTable, DOCUMENT_CELL_LIMIT, Design, DistributionRequest,
    MatchedUnit, MeasurementLevel, Metadata, TableRequest, Variable, VariableRole, WeightSpec,
};
use dpoll_report::{
    ALL_RESPONDENTS, AssembledTable, CHI_SQUARE_ROW, INSUFFICIENT_DATA, MANIFEST_FILE_NAME,
    MEAN_ROW, OutputFormat, OutputKind, OutputTableSet, TableRow, TableValue, UNWEIGHTED_N_ROW,
    assemble, assemble_distributions, document_xml, report_document_xml, sha256_file, summarize,
    write_docx, write_outputs,
};

fn metadata() -> Metadata {
    Metadata::new(vec![
        Variable::new("IDs", MeasurementLevel::Scale).with_role(VariableRole::Identifier),
        Variable::new("Time", MeasurementLevel::Scale)
            .with_role(VariableRole::TimeMarker)
            .with_value_label(1, "T1")
            .with_value_label(2, "T2"),
        Variable::new("Group", MeasurementLevel::Scale)
            .with_role(VariableRole::GroupMarker)
            .with_value_label(1, "Treatment")
            .with_value_label(2, "Control"),
        Variable::new("Q1", MeasurementLevel::Ordinal)
            .with_label("Support")
            .with_role(VariableRole::Ordinal)
            .with_value_label(1, "Low")
            .with_value_label(2, "Mid")
            .with_value_label(3, "High"),
        Variable::new("Gender", MeasurementLevel::Nominal)
            .with_role(VariableRole::Nominal)
            .with_value_label(1, "Male")
            .with_value_label(2, "Female"),
    ])
    .unwrap()
}

fn unit(id: i32, group: i32, waves: &[(i32, f64, f64)]) -> MatchedUnit {
    MatchedUnit {
        identifier: Code::from(id),
        group: Code::from(group),
        waves: waves
            .iter()
            .map(|&(time, q1, gender)| {
                let values =
                    BTreeMap::from([("Q1".to_string(), q1), ("Gender".to_string(), gender)]);
                (Code::from(time), values)
            })
            .collect(),
    }
}

fn units() -> Vec<MatchedUnit> {
    vec![
        unit(1, 1, &[(1, 1.0, 1.0), (2, 2.0, 1.0)]),
        unit(2, 1, &[(1, 2.0, 2.0), (2, 3.0, 2.0)]),
        unit(3, 1, &[(1, 1.0, 2.0), (2, 3.0, 2.0)]),
        unit(4, 2, &[(1, 3.0, 1.0)]),
        unit(5, 2, &[(1, 2.0, 2.0)]),
    ]
}

fn design() -> Design {
    Design {
        times: vec![Code::from(1), Code::from(2)],
        groups: vec![Code::from(1), Code::from(2)],
    }
}

fn table(breakdown: Option<&str>) -> ComparisonTable {
    aggregate(
        &units(),
        &design(),
        &metadata(),
        &TableRequest::new("Q1", breakdown.map(str::to_string), WeightSpec::Unweighted),
        &AnalysisOptions::default(),
    )
    .unwrap()
}

fn assembled(breakdown: Option<&str>) -> AssembledTable {
    let set = assemble(&[table(breakdown)], &metadata(), &AnalysisOptions::default());
    assert_eq!(set.len(), 1);
    set.tables.into_iter().next().unwrap()
}

#[test]
fn columns_follow_design_order() {
    let table = assembled(None);
    insta::assert_snapshot!(table.columns.join("\n"), @r"
    Treatment at T1
    Treatment at T2
    Control at T1
    Control at T2
    Treatment at T1 v. T2
    Control at T1 v. T2
    Treatment v. Control at T1
    Treatment v. Control at T2
    ");
    assert_eq!(table.title, "Support - All respondents (Unweighted)");
    assert_eq!(table.file_stem, "Tables - Support - All respondents (Unweighted)");
    assert!(table.sheet_name.chars().count() <= 31);
}

#[test]
fn rows_form_labeled_blocks() {
    let table = assembled(None);
    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![UNWEIGHTED_N_ROW, "Weighted n", MEAN_ROW, "Low", "Mid", "High"]
    );
    assert!(table.rows.iter().all(|r| r.block == ALL_RESPONDENTS));

    let sizes = table.row(ALL_RESPONDENTS, UNWEIGHTED_N_ROW).unwrap();
    assert_eq!(&sizes.values[..4], &[
        TableValue::Count(3),
        TableValue::Count(3),
        TableValue::Count(2),
        TableValue::Count(0),
    ]);

    // Control has nobody at T2: undefined, not zero.
    let mean = table.row(ALL_RESPONDENTS, MEAN_ROW).unwrap();
    assert_eq!(mean.values[3], TableValue::Undefined);
    assert_eq!(mean.values[3].to_string(), "N/A");
    assert_eq!(mean.values[1].to_string(), "2.667");
    // Treatment differences 1, 1, 2.
    assert!(matches!(
        mean.values[4],
        TableValue::Difference { p_value: Some(_), .. }
    ));
    assert!(mean.values[4].to_string().starts_with("1.333 (P = "));

    let low = table.row(ALL_RESPONDENTS, "Low").unwrap();
    assert_eq!(low.values[0].to_string(), "66.7%");
    assert_eq!(low.values[4].to_string(), "-66.7%");
}

#[test]
fn breakdown_adds_association_and_category_blocks() {
    let table = assembled(Some("Gender"));
    assert_eq!(table.title, "Support - Gender (Unweighted)");

    let blocks: Vec<&str> = table.rows.iter().map(|r| r.block.as_str()).fold(
        Vec::new(),
        |mut blocks, block| {
            if blocks.last() != Some(&block) {
                blocks.push(block);
            }
            blocks
        },
    );
    assert_eq!(blocks, vec![ALL_RESPONDENTS, "Male", "Female"]);

    let association = table
        .row(ALL_RESPONDENTS, "Association with Gender")
        .unwrap();
    assert!(association.values[..4].iter().all(|v| *v == TableValue::Empty));
    assert!(
        association.values[4..]
            .iter()
            .all(|v| matches!(v, TableValue::Text(_) | TableValue::Undefined))
    );

    let male_mean = table.row("Male", MEAN_ROW).unwrap();
    assert_eq!(male_mean.values[0].to_string(), "1.000");
    assert_eq!(table.block("Female").count(), 6);
}

#[test]
fn document_contains_title_and_undefined_marker() {
    let table = assembled(None);
    let xml = document_xml(&table).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
    assert!(xml.contains("<w:t xml:space=\"preserve\">Support - All respondents (Unweighted)</w:t>"));
    assert!(xml.contains(">N/A</w:t>"));
    assert!(xml.contains("<w:pgSz w:w=\"31680\" w:h=\"31680\"/>"));
}

#[test]
fn docx_package_has_required_parts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.docx");
    write_docx(&assembled(None), &path).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]);

    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut document)
        .unwrap();
    assert!(document.contains("Treatment v. Control at T1"));
}

#[test]
fn outputs_are_listed_in_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("Outputs").join("poll");
    let options = AnalysisOptions::default();
    let set = OutputTableSet {
        tables: vec![assembled(None), assembled(Some("Gender"))],
        reports: summarize(&[table(None), table(Some("Gender"))], &metadata(), &options),
    };
    let written = write_outputs(&set, &out).unwrap();

    assert_eq!(written.manifest.files.len(), 6);
    assert_eq!(written.manifest.count(OutputFormat::Xlsx), 2);
    assert_eq!(written.manifest.count(OutputFormat::Docx), 4);
    assert_eq!(written.manifest.count_kind(OutputKind::Report), 2);
    for file in &written.manifest.files {
        let path = out.join(&file.file);
        assert!(path.exists(), "missing {}", path.display());
        assert_eq!(file.sha256, sha256_file(&path).unwrap());
    }
    assert!(out.join("Tables - Support - Gender (Unweighted).xlsx").exists());
    assert!(out.join("Report - Gender (Unweighted).docx").exists());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join(MANIFEST_FILE_NAME)).unwrap())
            .unwrap();
    assert_eq!(json["schema"], "dpoll.output-manifest");
    assert_eq!(json["files"][0]["format"], "xlsx");
    assert_eq!(json["files"][0]["kind"], "table");
    assert_eq!(json["files"][5]["kind"], "report");
}

#[test]
fn distribution_table_shows_weighted_frequencies() {
    let distribution = aggregate_distribution(
        &units(),
        &design(),
        &metadata(),
        &DistributionRequest::new("Gender", WeightSpec::Unweighted),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let tables = assemble_distributions(&[distribution], &metadata());
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(table.title, "Gender - Distribution (Unweighted)");
    assert_eq!(table.file_stem, "Tables - Gender - Distribution (Unweighted)");
    assert_eq!(table.columns.len(), 8);
    assert_eq!(table.columns[4], "Treatment at T1 v. T2");

    let labels: Vec<&str> = table.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![UNWEIGHTED_N_ROW, "Weighted n", "Male", "Female", CHI_SQUARE_ROW]
    );
    let male = table.row(ALL_RESPONDENTS, "Male").unwrap();
    assert_eq!(male.values[0].to_string(), "33.3% (1)");
    // Control has nobody at T2.
    assert_eq!(male.values[3], TableValue::Undefined);
    assert_eq!(male.values[4].to_string(), "0.0%");

    let test = table.row(ALL_RESPONDENTS, CHI_SQUARE_ROW).unwrap();
    assert!(test.values[..4].iter().all(|v| *v == TableValue::Empty));
    assert!(matches!(test.values[6], TableValue::Text(ref text) if text.starts_with("P = ")));
}

#[test]
fn prose_report_describes_each_comparison() {
    let reports = summarize(&[table(None)], &metadata(), &AnalysisOptions::default());
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.title, "All respondents (Unweighted)");
    assert_eq!(report.file_stem, "Report - All respondents (Unweighted)");
    assert_eq!(report.entries.len(), 4);
    assert!(report.entries.iter().all(|e| e.variable == "Q1"));

    // Differences 1, 1, 2: t = 4 on 2 degrees of freedom.
    assert_eq!(report.entries[0].comparison, "Treatment at T1 v. T2");
    assert_eq!(
        report.entries[0].statement,
        "Treatment (n = 3) responded to the statement, \"Support\". The average response \
         did not change significantly (P = 0.057) between T1 and T2. At T2, there was a \
         majority response of \"High\" (66.7%) among this group, like at T1 (66.7%)."
    );

    // Nobody in Control answered twice.
    assert_eq!(report.entries[1].statement, INSUFFICIENT_DATA);

    let between = &report.entries[2].statement;
    assert!(between.starts_with(
        "Treatment at T1 and Control at T1 responded to the statement, \"Support\". There "
    ));
    assert!(between.contains("between Treatment at T1 (n = 3) and Control at T1 (n = 2)."));
    assert!(between.ends_with(
        "Among Control, there was a majority response of \"Mid\" (50.0%), like Treatment (66.7%)."
    ));
    assert_eq!(report.entries[3].statement, INSUFFICIENT_DATA);
}

#[test]
fn prose_report_covers_categories_and_renders_as_document() {
    let reports = summarize(
        &[table(None), table(Some("Gender"))],
        &metadata(),
        &AnalysisOptions::default(),
    );
    let titles: Vec<&str> = reports.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["All respondents (Unweighted)", "Gender (Unweighted)"]);

    let by_gender = &reports[1];
    assert!(
        by_gender.entries[0]
            .statement
            .contains("Among those who selected \"Female\" (n = 2), the average response")
    );

    let xml = report_document_xml(by_gender).unwrap();
    assert!(xml.contains("<w:t xml:space=\"preserve\">Gender (Unweighted)</w:t>"));
    assert!(xml.contains(">Summary</w:t>"));
    assert!(xml.contains("Treatment v. Control at T1"));
}

#[test]
fn large_tables_skip_the_document() {
    let columns: Vec<String> = (0..60).map(|i| format!("C{i}")).collect();
    let rows: Vec<TableRow> = (0..1_000)
        .map(|r| TableRow {
            block: ALL_RESPONDENTS.to_string(),
            label: format!("R{r}"),
            values: (0..60).map(|c| TableValue::Count(r * c)).collect(),
        })
        .collect();
    let table = AssembledTable::new(
        "Large".into(),
        "Tables - Large".into(),
        "Large".into(),
        columns,
        rows,
    );
    assert_eq!(table.cell_count, 60_000);
    assert!(table.cell_count >= DOCUMENT_CELL_LIMIT);

    let dir = tempfile::tempdir().unwrap();
    let set = OutputTableSet {
        tables: vec![table],
        reports: Vec::new(),
    };
    let written = write_outputs(&set, dir.path()).unwrap();
    assert_eq!(written.manifest.count(OutputFormat::Xlsx), 1);
    assert_eq!(written.manifest.count(OutputFormat::Docx), 0);
    assert!(dir.path().join("Tables - Large.xlsx").exists());
    assert!(!dir.path().join("Tables - Large.docx").exists());
}
