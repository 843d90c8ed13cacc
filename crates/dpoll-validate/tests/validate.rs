//! Validation gate tests.

use std::collections::BTreeSet;

use dpoll_model::{AnalysisOptions, Code, MeasurementLevel, SurveyData, Variable, VariableRole};
use dpoll_validate::{Issue, Severity, validate, write_validation_report_json};
use polars::prelude::*;
use proptest::prelude::*;

fn design_variables() -> Vec<Variable> {
    vec![
        Variable::new("IDs", MeasurementLevel::Scale)
            .with_label("Respondent")
            .with_role(VariableRole::Identifier),
        Variable::new("Time", MeasurementLevel::Scale)
            .with_label("Wave")
            .with_role(VariableRole::TimeMarker),
        Variable::new("Group", MeasurementLevel::Scale)
            .with_label("Arm")
            .with_role(VariableRole::GroupMarker),
    ]
}

fn scale_0_to_10() -> Variable {
    let mut var = Variable::new("Q1", MeasurementLevel::Ordinal)
        .with_label("Support")
        .with_role(VariableRole::Ordinal);
    for code in 0..=10 {
        var = var.with_value_label(code, format!("{code}"));
    }
    var
}

fn survey(q1: Vec<Option<f64>>) -> SurveyData {
    let n = q1.len();
    let ids: Vec<f64> = (0..n).map(|i| (i / 2 + 1) as f64).collect();
    let times: Vec<f64> = (0..n).map(|i| (i % 2 + 1) as f64).collect();
    let groups: Vec<f64> = (0..n).map(|i| if i < n / 2 { 1.0 } else { 2.0 }).collect();
    let df = DataFrame::new(vec![
        Column::new("IDs".into(), ids),
        Column::new("Time".into(), times),
        Column::new("Group".into(), groups),
        Column::new("Q1".into(), q1),
    ])
    .unwrap();
    let mut variables = design_variables();
    variables.push(scale_0_to_10());
    SurveyData::new("poll", df, variables)
}

#[test]
fn clean_dataset_passes() {
    let data = survey(vec![Some(1.0), Some(5.0), Some(10.0), None]);
    let report = validate(&data, &AnalysisOptions::default());
    assert!(report.is_empty(), "{:?}", report.issues);
}

#[test]
fn unlabeled_codes_are_all_reported() {
    let data = survey(vec![Some(1.0), Some(99.0), Some(98.0), Some(99.0)]);
    let report = validate(&data, &AnalysisOptions::default());
    assert_eq!(
        report.issues,
        vec![Issue::UnlabeledValue {
            variable: "Q1".to_string(),
            codes: vec![Code::from(98), Code::from(99)],
        }]
    );
}

#[test]
fn missing_roles_and_labels_collected_together() {
    let df = DataFrame::new(vec![
        Column::new("IDs".into(), [1.0, 2.0]),
        Column::new("Q1".into(), [1.0, 2.0]),
        Column::new("Extra".into(), [0.0, 0.0]),
    ])
    .unwrap();
    let variables = vec![
        Variable::new("IDs", MeasurementLevel::Scale).with_role(VariableRole::Identifier),
        Variable::new("Q1", MeasurementLevel::Ordinal)
            .with_role(VariableRole::Ordinal)
            .with_value_label(1, "Low")
            .with_value_label(2, "High"),
    ];
    let report = validate(&SurveyData::new("poll", df, variables), &AnalysisOptions::default());

    assert_eq!(report.error_count(), 3);
    assert!(report.issues.contains(&Issue::RoleMissing {
        role: VariableRole::TimeMarker
    }));
    assert!(report.issues.contains(&Issue::RoleMissing {
        role: VariableRole::GroupMarker
    }));
    assert!(report.issues.contains(&Issue::MissingColumnLabel {
        variable: "Q1".to_string()
    }));
    assert_eq!(report.warning_count(), 1);
    assert!(report.issues.contains(&Issue::UndeclaredColumn {
        column: "Extra".to_string()
    }));
}

#[test]
fn duplicated_role_names_offenders() {
    let mut data = survey(vec![Some(1.0), Some(2.0)]);
    data.variables.push(
        Variable::new("Wave", MeasurementLevel::Scale).with_role(VariableRole::TimeMarker),
    );
    let report = validate(&data, &AnalysisOptions::default());
    assert!(report.issues.contains(&Issue::RoleDuplicated {
        role: VariableRole::TimeMarker,
        variables: vec!["Time".to_string(), "Wave".to_string()],
    }));
    assert!(report.issues.contains(&Issue::ColumnMissing {
        variable: "Wave".to_string()
    }));
}

#[test]
fn no_ordinal_variable_is_insufficient() {
    let mut data = survey(vec![Some(1.0), Some(2.0)]);
    data.variables.retain(|v| v.name != "Q1");
    let report = validate(&data, &AnalysisOptions::default());
    assert!(report.issues.contains(&Issue::InsufficientDesign {
        ordinal_variables: 0,
        group_time_pairs: 2,
    }));
}

#[test]
fn design_nulls_and_negative_weights() {
    let df = DataFrame::new(vec![
        Column::new("IDs".into(), [Some(1.0), None, Some(3.0)]),
        Column::new("Time".into(), [1.0, 1.0, 1.0]),
        Column::new("Group".into(), [1.0, 1.0, 2.0]),
        Column::new("Q1".into(), [1.0, 2.0, 3.0]),
        Column::new("weight".into(), [Some(1.0), Some(-0.5), None]),
    ])
    .unwrap();
    let mut variables = design_variables();
    variables.push(scale_0_to_10());
    variables.push(Variable::new("weight", MeasurementLevel::Scale).with_role(VariableRole::Weight));
    let report = validate(&SurveyData::new("poll", df, variables), &AnalysisOptions::default());

    assert_eq!(
        report.errors().cloned().collect::<Vec<_>>(),
        vec![
            Issue::DesignValueMissing {
                variable: "IDs".to_string(),
                count: 1
            },
            Issue::NegativeWeight {
                variable: "weight".to_string(),
                count: 1
            },
        ]
    );
}

#[test]
fn configuration_warnings_do_not_block() {
    let data = survey(vec![Some(1.0), Some(2.0)]);
    let options = AnalysisOptions::new()
        .with_missing_codes(vec![Code::from(99)])
        .with_weights(vec!["w_post".to_string()]);
    let report = validate(&data, &options);
    assert!(!report.has_errors());
    assert!(report.warnings().all(|i| i.severity() == Severity::Warning));
    assert_eq!(report.warning_count(), 2);
    assert!(report.into_result().is_ok());
}

#[test]
fn json_report_written_with_schema_header() {
    let dir = tempfile::TempDir::new().unwrap();
    let data = survey(vec![Some(99.0), Some(2.0)]);
    let report = validate(&data, &AnalysisOptions::default());
    let path = write_validation_report_json(dir.path(), &report).unwrap();

    assert!(path.ends_with("poll.validation.json"));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["schema"], "dpoll.validation-report");
    assert_eq!(json["error_count"], 1);
    assert_eq!(json["issues"][0]["variable"], "Q1");
    assert_eq!(json["issues"][0]["severity"], "Error");
}

proptest! {
    #[test]
    fn labeled_subsets_always_pass(codes in prop::collection::vec(prop::option::of(0i32..=10), 2..40)) {
        let values = codes.iter().map(|c| c.map(f64::from)).collect();
        let report = validate(&survey(values), &AnalysisOptions::default());
        prop_assert!(!report.has_errors(), "{:?}", report.issues);
    }

    #[test]
    fn every_unlabeled_code_is_named(
        codes in prop::collection::vec(0i32..=10, 1..20),
        extra in prop::collection::btree_set(11i32..200, 1..5),
    ) {
        let mut values: Vec<Option<f64>> = codes.iter().map(|&c| Some(f64::from(c))).collect();
        values.extend(extra.iter().map(|&c| Some(f64::from(c))));
        let report = validate(&survey(values), &AnalysisOptions::default());
        let expected: Vec<Code> = extra.iter().map(|&c| Code::from(c)).collect::<BTreeSet<_>>().into_iter().collect();
        prop_assert_eq!(
            report.errors().cloned().collect::<Vec<_>>(),
            vec![Issue::UnlabeledValue { variable: "Q1".to_string(), codes: expected }]
        );
    }
}
