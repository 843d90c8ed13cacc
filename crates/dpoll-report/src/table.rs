//! Assembled, writer-ready tables.

use std::fmt;

use serde::Serialize;

use crate::prose::ProseReport;

/// Text shown for undefined statistics; never rendered as zero.
pub const UNDEFINED_TEXT: &str = "N/A";

/// One rendered value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableValue {
    Empty,
    Text(String),
    Count(usize),
    Number(f64),
    /// A share in `[0, 1]`, or a signed difference of shares.
    Percent(f64),
    /// Weighted count with its share of the column.
    Frequency { count: f64, share: f64 },
    /// Mean difference with its test.
    Difference {
        value: f64,
        p_value: Option<f64>,
        significant: bool,
    },
    Undefined,
}

impl TableValue {
    pub fn is_populated(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl fmt::Display for TableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Count(n) => write!(f, "{n}"),
            Self::Number(v) => write!(f, "{v:.3}"),
            Self::Percent(share) => write!(f, "{:.1}%", share * 100.0),
            Self::Frequency { count, share } => {
                write!(f, "{:.1}% ({count:.0})", share * 100.0)
            }
            Self::Difference {
                value,
                p_value,
                significant,
            } => {
                write!(f, "{value:.3}")?;
                if let Some(p) = p_value {
                    write!(f, " (P = {p:.3})")?;
                }
                if *significant {
                    f.write_str("*")?;
                }
                Ok(())
            }
            Self::Undefined => f.write_str(UNDEFINED_TEXT),
        }
    }
}

/// One row of an assembled table: block label, row label, one value per
/// column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub block: String,
    pub label: String,
    pub values: Vec<TableValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledTable {
    pub title: String,
    pub file_stem: String,
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
    /// Populated values across all rows.
    pub cell_count: usize,
}

impl AssembledTable {
    pub fn new(
        title: String,
        file_stem: String,
        sheet_name: String,
        columns: Vec<String>,
        rows: Vec<TableRow>,
    ) -> Self {
        let cell_count = rows
            .iter()
            .flat_map(|row| &row.values)
            .filter(|v| v.is_populated())
            .count();
        Self {
            title,
            file_stem,
            sheet_name,
            columns,
            rows,
            cell_count,
        }
    }

    /// Rows belonging to one block, in order.
    pub fn block<'a>(&'a self, block: &'a str) -> impl Iterator<Item = &'a TableRow> + 'a {
        self.rows.iter().filter(move |row| row.block == block)
    }

    pub fn row(&self, block: &str, label: &str) -> Option<&TableRow> {
        self.rows
            .iter()
            .find(|row| row.block == block && row.label == label)
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}

/// Every assembled table and prose report of one run, in request order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputTableSet {
    pub tables: Vec<AssembledTable>,
    pub reports: Vec<ProseReport>,
}

impl OutputTableSet {
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AssembledTable> {
        self.tables.iter()
    }
}

impl<'a> IntoIterator for &'a OutputTableSet {
    type Item = &'a AssembledTable;
    type IntoIter = std::slice::Iter<'a, AssembledTable>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
