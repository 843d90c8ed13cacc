//! Output formats and the names files and sheets are given.

use std::fmt;

use serde::Serialize;

use dpoll_model::DOCUMENT_CELL_LIMIT;

/// Excel's sheet-name length limit.
pub const SHEET_NAME_LIMIT: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Xlsx,
    Docx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What an output file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Table,
    Report,
}

/// Formats written for a table with `cell_count` populated values.
///
/// The spreadsheet is always written; the document only below
/// [`DOCUMENT_CELL_LIMIT`].
pub fn planned_formats(cell_count: usize) -> Vec<OutputFormat> {
    if cell_count < DOCUMENT_CELL_LIMIT {
        vec![OutputFormat::Xlsx, OutputFormat::Docx]
    } else {
        vec![OutputFormat::Xlsx]
    }
}

/// Replaces characters that are not allowed in file names on common
/// platforms.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    cleaned.trim().trim_end_matches('.').to_string()
}

/// A valid worksheet name: forbidden characters replaced and names longer
/// than 31 characters cut to 28 plus "...".
pub fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.chars().count() > SHEET_NAME_LIMIT {
        let head: String = cleaned.chars().take(SHEET_NAME_LIMIT - 3).collect();
        format!("{head}...")
    } else if cleaned.is_empty() {
        "Table".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_only_below_the_limit() {
        assert_eq!(
            planned_formats(DOCUMENT_CELL_LIMIT - 1),
            vec![OutputFormat::Xlsx, OutputFormat::Docx]
        );
        assert_eq!(planned_formats(DOCUMENT_CELL_LIMIT), vec![OutputFormat::Xlsx]);
        assert_eq!(planned_formats(60_000), vec![OutputFormat::Xlsx]);
    }

    #[test]
    fn file_names_lose_path_characters() {
        assert_eq!(
            sanitize_file_name("Tables - Q1: Trust/Distrust (w?)"),
            "Tables - Q1_ Trust_Distrust (w_)"
        );
    }

    #[test]
    fn long_sheet_names_are_truncated() {
        let name = sheet_name("Support for the proposal - All respondents (Unweighted)");
        assert_eq!(name.chars().count(), SHEET_NAME_LIMIT);
        assert!(name.ends_with("..."));
        assert_eq!(sheet_name("Q1 [wave]"), "Q1 _wave_");
        assert_eq!(sheet_name("Short"), "Short");
    }
}
