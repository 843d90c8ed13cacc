//! CSV loading into a Polars DataFrame.

use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Reads a CSV file with a single header row.
///
/// Every column is read as text so a late fractional or text value cannot
/// fail the parse; [`normalize_columns`](crate::normalize_columns) does the
/// typing afterwards.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_frame_shape(&df, path)?;
    Ok(df)
}

fn validate_frame_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }
    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}
