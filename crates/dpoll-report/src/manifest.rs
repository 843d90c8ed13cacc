//! Writes every assembled table and records what was written.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::docx::{write_docx, write_report_docx};
use crate::error::{ReportError, Result};
use crate::format::{OutputFormat, OutputKind, planned_formats};
use crate::prose::ProseReport;
use crate::table::{AssembledTable, OutputTableSet};
use crate::xlsx::write_xlsx;

pub const MANIFEST_SCHEMA: &str = "dpoll.output-manifest";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// One written output file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenFile {
    /// File name relative to the output directory.
    pub file: String,
    pub kind: OutputKind,
    /// Title of the table or report.
    pub table: String,
    pub format: OutputFormat,
    /// Zero for reports.
    pub cell_count: usize,
    pub bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputManifest {
    pub schema: &'static str,
    pub schema_version: u32,
    pub generated_at: String,
    pub files: Vec<WrittenFile>,
}

impl OutputManifest {
    pub fn count(&self, format: OutputFormat) -> usize {
        self.files.iter().filter(|f| f.format == format).count()
    }

    pub fn count_kind(&self, kind: OutputKind) -> usize {
        self.files.iter().filter(|f| f.kind == kind).count()
    }
}

/// Result of [`write_outputs`].
#[derive(Debug, Clone)]
pub struct WrittenOutputs {
    pub dir: PathBuf,
    pub manifest_path: PathBuf,
    pub manifest: OutputManifest,
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| ReportError::io(path, e))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// A stem not used by any earlier table; repeated titles get " (2)", " (3)".
fn unique_stem(stem: &str, used: &mut BTreeSet<String>) -> String {
    let mut candidate = stem.to_string();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{stem} ({n})");
        n += 1;
    }
    candidate
}

fn written_file(
    dir: &Path,
    file: String,
    kind: OutputKind,
    title: &str,
    format: OutputFormat,
    cell_count: usize,
) -> Result<WrittenFile> {
    let path = dir.join(&file);
    let bytes = fs::metadata(&path)
        .map_err(|e| ReportError::io(&path, e))?
        .len();
    debug!(file = %file, bytes, "output written");
    Ok(WrittenFile {
        sha256: sha256_file(&path)?,
        file,
        kind,
        table: title.to_string(),
        format,
        cell_count,
        bytes,
    })
}

fn write_table(table: &AssembledTable, stem: &str, dir: &Path) -> Result<Vec<WrittenFile>> {
    let mut written = Vec::new();
    for format in planned_formats(table.cell_count) {
        let file = format!("{stem}.{}", format.extension());
        let path = dir.join(&file);
        match format {
            OutputFormat::Xlsx => write_xlsx(table, &path)?,
            OutputFormat::Docx => write_docx(table, &path)?,
        }
        written.push(written_file(
            dir,
            file,
            OutputKind::Table,
            &table.title,
            format,
            table.cell_count,
        )?);
    }
    Ok(written)
}

fn write_report(report: &ProseReport, stem: &str, dir: &Path) -> Result<WrittenFile> {
    let format = OutputFormat::Docx;
    let file = format!("{stem}.{}", format.extension());
    write_report_docx(report, &dir.join(&file))?;
    written_file(dir, file, OutputKind::Report, &report.title, format, 0)
}

/// Creates `dir`, writes each table in its planned formats and each prose
/// report as a document, and finishes with `manifest.json`.
pub fn write_outputs(set: &OutputTableSet, dir: &Path) -> Result<WrittenOutputs> {
    fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;

    let mut used = BTreeSet::new();
    let mut files = Vec::new();
    for table in set {
        let stem = unique_stem(&table.file_stem, &mut used);
        files.extend(write_table(table, &stem, dir)?);
    }
    for report in &set.reports {
        let stem = unique_stem(&report.file_stem, &mut used);
        files.push(write_report(report, &stem, dir)?);
    }

    let manifest = OutputManifest {
        schema: MANIFEST_SCHEMA,
        schema_version: MANIFEST_SCHEMA_VERSION,
        generated_at: Utc::now().to_rfc3339(),
        files,
    };
    let manifest_path = dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, json).map_err(|e| ReportError::io(&manifest_path, e))?;

    info!(
        dir = %dir.display(),
        spreadsheets = manifest.count(OutputFormat::Xlsx),
        documents = manifest.count(OutputFormat::Docx),
        reports = manifest.count_kind(OutputKind::Report),
        "outputs written"
    );
    Ok(WrittenOutputs {
        dir: dir.to_path_buf(),
        manifest_path,
        manifest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_stems_are_numbered() {
        let mut used = BTreeSet::new();
        assert_eq!(unique_stem("Tables - Q1", &mut used), "Tables - Q1");
        assert_eq!(unique_stem("Tables - Q1", &mut used), "Tables - Q1 (2)");
        assert_eq!(unique_stem("Tables - Q1", &mut used), "Tables - Q1 (3)");
    }
}
