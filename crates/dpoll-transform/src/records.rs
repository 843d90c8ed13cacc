//! Respondent record extraction from the normalized frame.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, DataType};

use dpoll_model::{Code, Metadata, RespondentRecord, SurveyData, VariableRole};

use crate::error::{Result, TransformError};

fn column_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.iter().collect())
}

/// Turns every row of the dataset into a [`RespondentRecord`].
///
/// Values are kept for every declared non-design variable that has a
/// column; nulls and non-finite values are omitted. Rows are numbered from 1.
pub fn extract_records(data: &SurveyData, metadata: &Metadata) -> Result<Vec<RespondentRecord>> {
    let id_var = metadata.require_role(VariableRole::Identifier)?;
    let time_var = metadata.require_role(VariableRole::TimeMarker)?;
    let group_var = metadata.require_role(VariableRole::GroupMarker)?;

    let ids = column_f64(&data.data, &id_var.name)?;
    let times = column_f64(&data.data, &time_var.name)?;
    let groups = column_f64(&data.data, &group_var.name)?;

    let mut value_columns = Vec::new();
    for variable in metadata.variables() {
        if variable.role.is_some_and(|r| r.is_design()) || !data.has_column(&variable.name) {
            continue;
        }
        value_columns.push((variable.name.as_str(), column_f64(&data.data, &variable.name)?));
    }

    let design_code = |values: &[Option<f64>], variable: &str, index: usize| -> Result<Code> {
        values[index]
            .and_then(Code::new)
            .ok_or_else(|| TransformError::DesignValueMissing {
                variable: variable.to_string(),
                row: index + 1,
            })
    };

    let mut records = Vec::with_capacity(data.row_count());
    for index in 0..data.row_count() {
        let mut values = BTreeMap::new();
        for (name, column) in &value_columns {
            if let Some(value) = column[index].filter(|v| v.is_finite()) {
                values.insert((*name).to_string(), value);
            }
        }
        records.push(RespondentRecord {
            row: index + 1,
            identifier: design_code(&ids, &id_var.name, index)?,
            time: design_code(&times, &time_var.name, index)?,
            group: design_code(&groups, &group_var.name, index)?,
            values,
        });
    }

    tracing::debug!(records = records.len(), "extracted respondent records");
    Ok(records)
}
