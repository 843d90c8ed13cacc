//! Individual validation checks. Each returns every issue it finds.

pub mod design;
pub mod labels;
pub mod roles;
pub mod structure;
pub mod weights;

use polars::prelude::{DataFrame, DataType};

/// Column values as `f64`, or `None` when the column is absent.
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Option<Vec<Option<f64>>> {
    let column = df.column(name).ok()?.cast(&DataType::Float64).ok()?;
    let values = column.f64().ok()?.iter().collect();
    Some(values)
}
