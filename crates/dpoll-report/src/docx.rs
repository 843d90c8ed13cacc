//! Rich-document output as a minimal WordprocessingML package.
//!
//! Both table documents and prose reports use the same package layout.
//!
//! The package holds three parts: `[Content_Types].xml`, `_rels/.rels` and
//! `word/document.xml`. Pages are 22in square with 0.5in margins so wide
//! comparison tables fit on one page.

use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{ReportError, Result};
use crate::prose::ProseReport;
use crate::table::AssembledTable;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// 22in in twentieths of a point.
const PAGE_SIZE_TWIPS: &str = "31680";
/// 0.5in.
const MARGIN_TWIPS: &str = "720";
const FONT: &str = "Arial";
/// Half-points.
const TITLE_SIZE: &str = "28";
const BODY_SIZE: &str = "18";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn markup(err: impl Display) -> ReportError {
    ReportError::Markup {
        message: err.to_string(),
    }
}

struct DocumentWriter {
    xml: Writer<Vec<u8>>,
}

impl DocumentWriter {
    fn new() -> Self {
        Self {
            xml: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.xml.write_event(event).map_err(markup)
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.event(Event::Start(element))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        self.event(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn paragraph(&mut self, text: &str, bold: bool, size: &str, centered: bool) -> Result<()> {
        self.start("w:p", &[])?;
        if centered {
            self.start("w:pPr", &[])?;
            self.empty("w:jc", &[("w:val", "center")])?;
            self.end("w:pPr")?;
        }
        self.start("w:r", &[])?;
        self.start("w:rPr", &[])?;
        self.empty("w:rFonts", &[("w:ascii", FONT), ("w:hAnsi", FONT), ("w:cs", FONT)])?;
        if bold {
            self.empty("w:b", &[])?;
        }
        self.empty("w:sz", &[("w:val", size)])?;
        self.end("w:rPr")?;
        self.start("w:t", &[("xml:space", "preserve")])?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end("w:t")?;
        self.end("w:r")?;
        self.end("w:p")
    }

    fn cell(&mut self, text: &str, bold: bool, centered: bool) -> Result<()> {
        self.start("w:tc", &[])?;
        self.start("w:tcPr", &[])?;
        self.empty("w:tcW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.empty("w:vAlign", &[("w:val", "bottom")])?;
        self.end("w:tcPr")?;
        self.paragraph(text, bold, BODY_SIZE, centered)?;
        self.end("w:tc")
    }

    fn table_properties(&mut self) -> Result<()> {
        self.start("w:tblPr", &[])?;
        self.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")])?;
        self.start("w:tblBorders", &[])?;
        for edge in ["w:top", "w:bottom", "w:insideH"] {
            self.empty(
                edge,
                &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "000000")],
            )?;
        }
        self.end("w:tblBorders")?;
        self.end("w:tblPr")
    }

    fn section(&mut self) -> Result<()> {
        self.start("w:sectPr", &[])?;
        self.empty("w:pgSz", &[("w:w", PAGE_SIZE_TWIPS), ("w:h", PAGE_SIZE_TWIPS)])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", MARGIN_TWIPS),
                ("w:right", MARGIN_TWIPS),
                ("w:bottom", MARGIN_TWIPS),
                ("w:left", MARGIN_TWIPS),
                ("w:header", MARGIN_TWIPS),
                ("w:footer", MARGIN_TWIPS),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.xml.into_inner()).map_err(markup)
    }
}

fn open_document(doc: &mut DocumentWriter, title: &str) -> Result<()> {
    doc.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    doc.start("w:document", &[("xmlns:w", WORDML_NS)])?;
    doc.start("w:body", &[])?;
    doc.paragraph(title, true, TITLE_SIZE, false)
}

fn close_document(mut doc: DocumentWriter) -> Result<String> {
    doc.section()?;
    doc.end("w:body")?;
    doc.end("w:document")?;
    doc.finish()
}

fn open_table(doc: &mut DocumentWriter, columns: usize) -> Result<()> {
    doc.start("w:tbl", &[])?;
    doc.table_properties()?;
    doc.start("w:tblGrid", &[])?;
    for _ in 0..columns {
        doc.empty("w:gridCol", &[])?;
    }
    doc.end("w:tblGrid")
}

/// Body of `word/document.xml` for one table.
pub fn document_xml(table: &AssembledTable) -> Result<String> {
    let mut doc = DocumentWriter::new();
    open_document(&mut doc, &table.title)?;
    open_table(&mut doc, table.columns.len() + 2)?;

    doc.start("w:tr", &[])?;
    doc.cell("", true, false)?;
    doc.cell("", true, false)?;
    for column in &table.columns {
        doc.cell(column, true, true)?;
    }
    doc.end("w:tr")?;

    let mut previous_block: Option<&str> = None;
    for row in &table.rows {
        doc.start("w:tr", &[])?;
        let block = if previous_block == Some(row.block.as_str()) {
            ""
        } else {
            row.block.as_str()
        };
        previous_block = Some(row.block.as_str());
        doc.cell(block, true, false)?;
        doc.cell(&row.label, false, false)?;
        for value in &row.values {
            doc.cell(&value.to_string(), false, true)?;
        }
        doc.end("w:tr")?;
    }
    doc.end("w:tbl")?;
    close_document(doc)
}

/// Body of `word/document.xml` for one prose report: a three-column table
/// of variable, comparison and statement.
pub fn report_document_xml(report: &ProseReport) -> Result<String> {
    let mut doc = DocumentWriter::new();
    open_document(&mut doc, &report.title)?;
    open_table(&mut doc, 3)?;

    doc.start("w:tr", &[])?;
    for header in ["Variable", "Comparison", "Summary"] {
        doc.cell(header, true, false)?;
    }
    doc.end("w:tr")?;

    let mut previous_variable: Option<&str> = None;
    for entry in &report.entries {
        doc.start("w:tr", &[])?;
        let variable = if previous_variable == Some(entry.variable.as_str()) {
            ""
        } else {
            entry.variable.as_str()
        };
        previous_variable = Some(entry.variable.as_str());
        doc.cell(variable, true, false)?;
        doc.cell(&entry.comparison, false, false)?;
        doc.cell(&entry.statement, false, false)?;
        doc.end("w:tr")?;
    }
    doc.end("w:tbl")?;
    close_document(doc)
}

fn write_package(document: &str, path: &Path) -> Result<()> {
    let package = |source: zip::result::ZipError| ReportError::Package {
        path: path.to_path_buf(),
        source,
    };
    let io = |source: std::io::Error| ReportError::io(path, source);

    let file = File::create(path).map_err(io)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, contents) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/document.xml", document),
    ] {
        zip.start_file(name, options).map_err(package)?;
        zip.write_all(contents.as_bytes()).map_err(io)?;
    }
    zip.finish().map_err(package)?;
    Ok(())
}

/// Writes one table as a `.docx` package.
pub fn write_docx(table: &AssembledTable, path: &Path) -> Result<()> {
    write_package(&document_xml(table)?, path)
}

/// Writes one prose report as a `.docx` package.
pub fn write_report_docx(report: &ProseReport, path: &Path) -> Result<()> {
    write_package(&report_document_xml(report)?, path)
}
