//! Column normalization: every column becomes `Float64`.

use std::collections::BTreeMap;

use polars::prelude::*;

use dpoll_model::{Code, Variable};

use crate::error::{IngestError, Result};

const SAMPLE_LIMIT: usize = 5;

/// Casts every column of `df` to `Float64`.
///
/// Text columns whose values all parse as numbers are converted. Text
/// columns of design variables (identifier, time, group) are recoded
/// 1, 2, ... by first appearance and the text becomes the variable's value
/// labels. Any other text column is a [`IngestError::NonNumeric`].
/// Blank cells become nulls.
pub fn normalize_columns(df: &DataFrame, variables: &mut [Variable]) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let name = column.name().to_string();
        let normalized = if column.dtype() == &DataType::String {
            let texts: Vec<Option<String>> = column
                .str()?
                .iter()
                .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
                .collect();
            let declared = variables.iter_mut().find(|v| v.name == name);
            text_to_numbers(&name, &texts, declared)?
        } else {
            let cast = column.cast(&DataType::Float64)?;
            cast.f64()?.iter().collect()
        };
        columns.push(Column::new(name.into(), normalized));
    }
    Ok(DataFrame::new(columns)?)
}

fn text_to_numbers(
    name: &str,
    texts: &[Option<String>],
    declared: Option<&mut Variable>,
) -> Result<Vec<Option<f64>>> {
    let parsed: Vec<Option<std::result::Result<f64, &str>>> = texts
        .iter()
        .map(|t| t.as_deref().map(|s| s.parse::<f64>().map_err(|_| s)))
        .collect();

    let failures: Vec<&str> = parsed
        .iter()
        .filter_map(|p| match p {
            Some(Err(text)) => Some(*text),
            _ => None,
        })
        .collect();

    if failures.is_empty() {
        return Ok(parsed.into_iter().map(|p| p.and_then(|r| r.ok())).collect());
    }

    match declared {
        Some(variable) if variable.role.is_some_and(|r| r.is_design()) => {
            Ok(recode_by_appearance(texts, variable))
        }
        // Undeclared columns are auxiliary; their text is dropped.
        None => {
            tracing::debug!(column = name, "dropping text values of undeclared column");
            Ok(parsed.into_iter().map(|p| p.and_then(|r| r.ok())).collect())
        }
        Some(_) => {
            let mut samples: Vec<String> = Vec::new();
            for text in &failures {
                if samples.len() >= SAMPLE_LIMIT {
                    break;
                }
                if !samples.iter().any(|s| s == text) {
                    samples.push((*text).to_string());
                }
            }
            Err(IngestError::NonNumeric {
                variable: name.to_string(),
                count: failures.len(),
                samples,
            })
        }
    }
}

fn recode_by_appearance(texts: &[Option<String>], variable: &mut Variable) -> Vec<Option<f64>> {
    let mut codes: BTreeMap<&str, f64> = BTreeMap::new();
    let mut next = 1.0;
    let values = texts
        .iter()
        .map(|text| {
            let text = text.as_deref()?;
            let code = *codes.entry(text).or_insert_with(|| {
                let code = next;
                next += 1.0;
                code
            });
            Some(code)
        })
        .collect();

    for (text, code) in codes {
        if let Some(code) = Code::new(code) {
            variable.value_labels.insert(code, text.to_string());
        }
    }
    tracing::debug!(
        variable = %variable.name,
        levels = variable.value_labels.len(),
        "recoded text design variable"
    );
    values
}
