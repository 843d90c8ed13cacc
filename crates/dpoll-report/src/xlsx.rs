//! Spreadsheet output.

use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};

use crate::error::{ReportError, Result};
use crate::table::{AssembledTable, TableValue};

/// Columns before the first value column: block and row label.
const LABEL_COLUMNS: u16 = 2;
const HEADER_ROW: u32 = 2;

struct Formats {
    title: Format,
    header: Format,
    block: Format,
    number: Format,
    percent: Format,
    centered: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(14),
            header: Format::new()
                .set_bold()
                .set_text_wrap()
                .set_align(FormatAlign::Center),
            block: Format::new().set_bold(),
            number: Format::new().set_num_format("0.000"),
            percent: Format::new().set_num_format("0.0%"),
            centered: Format::new().set_align(FormatAlign::Center),
        }
    }
}

/// Writes one table as a single-sheet workbook.
pub fn write_xlsx(table: &AssembledTable, path: &Path) -> Result<()> {
    let spreadsheet = |source: XlsxError| ReportError::Spreadsheet {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    fill_sheet(worksheet, table).map_err(spreadsheet)?;
    workbook.save(path).map_err(spreadsheet)
}

fn column(index: usize) -> std::result::Result<u16, XlsxError> {
    u16::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(LABEL_COLUMNS))
        .ok_or(XlsxError::RowColumnLimitError)
}

fn fill_sheet(
    sheet: &mut Worksheet,
    table: &AssembledTable,
) -> std::result::Result<(), XlsxError> {
    let formats = Formats::new();
    sheet.set_name(&table.sheet_name)?;
    sheet.write_string_with_format(0, 0, &table.title, &formats.title)?;

    sheet.set_column_width(0, 24)?;
    sheet.set_column_width(1, 28)?;
    for (i, label) in table.columns.iter().enumerate() {
        let col = column(i)?;
        sheet.set_column_width(col, 22)?;
        sheet.write_string_with_format(HEADER_ROW, col, label, &formats.header)?;
    }

    let mut previous_block: Option<&str> = None;
    for (offset, row) in table.rows.iter().enumerate() {
        let r = u32::try_from(offset)
            .ok()
            .and_then(|o| o.checked_add(HEADER_ROW + 1))
            .ok_or(XlsxError::RowColumnLimitError)?;
        if previous_block != Some(row.block.as_str()) {
            sheet.write_string_with_format(r, 0, &row.block, &formats.block)?;
            previous_block = Some(row.block.as_str());
        }
        sheet.write_string(r, 1, &row.label)?;
        for (i, value) in row.values.iter().enumerate() {
            let col = column(i)?;
            match value {
                TableValue::Empty => {}
                TableValue::Count(n) => {
                    sheet.write_number_with_format(r, col, *n as f64, &formats.centered)?;
                }
                TableValue::Number(v) => {
                    sheet.write_number_with_format(r, col, *v, &formats.number)?;
                }
                TableValue::Percent(v) => {
                    sheet.write_number_with_format(r, col, *v, &formats.percent)?;
                }
                TableValue::Text(_)
                | TableValue::Frequency { .. }
                | TableValue::Difference { .. }
                | TableValue::Undefined => {
                    sheet.write_string_with_format(r, col, value.to_string(), &formats.centered)?;
                }
            }
        }
    }
    Ok(())
}
