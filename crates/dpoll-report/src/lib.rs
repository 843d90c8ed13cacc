//! Table assembly and output writing.
//!
//! - **assemble**: comparison and distribution tables laid out as labeled
//!   rows and columns
//! - **prose**: plain-language report per breakdown and weight
//! - **xlsx**: one workbook per table, always written
//! - **docx**: WordprocessingML document, written for tables below
//!   [`DOCUMENT_CELL_LIMIT`](dpoll_model::DOCUMENT_CELL_LIMIT) cells
//! - **manifest**: output directory listing with SHA-256 digests

mod assemble;
mod docx;
mod error;
mod format;
mod manifest;
mod prose;
mod table;
mod xlsx;

// === Assembly ===
pub use assemble::{
    ALL_RESPONDENTS, CHI_SQUARE_ROW, MEAN_ROW, UNWEIGHTED_N_ROW, WEIGHTED_N_ROW, assemble,
    assemble_distributions,
};
pub use prose::{INSUFFICIENT_DATA, Prevalence, ProseEntry, ProseReport, summarize};
pub use table::{AssembledTable, OutputTableSet, TableRow, TableValue, UNDEFINED_TEXT};

// === Writers ===
pub use docx::{document_xml, report_document_xml, write_docx, write_report_docx};
pub use format::{
    OutputFormat, OutputKind, SHEET_NAME_LIMIT, planned_formats, sanitize_file_name, sheet_name,
};
pub use manifest::{
    MANIFEST_FILE_NAME, MANIFEST_SCHEMA, MANIFEST_SCHEMA_VERSION, OutputManifest, WrittenFile,
    WrittenOutputs, sha256_file, write_outputs,
};
pub use xlsx::write_xlsx;

// === Errors ===
pub use error::{ReportError, Result};
