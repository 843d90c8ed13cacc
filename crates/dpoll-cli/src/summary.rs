use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use dpoll_cli::types::{CheckSummary, RunSummary};
use dpoll_report::{OutputFormat, OutputKind};
use dpoll_validate::{Issue, Severity, ValidationReport};

pub fn print_run_summary(summary: &RunSummary) {
    println!("Dataset: {}", summary.dataset);
    println!(
        "Respondents: {} ({} rows, {} time points, {} groups)",
        summary.units,
        summary.rows,
        summary.design.times.len(),
        summary.design.groups.len()
    );
    println!("Output: {}", summary.outputs.dir.display());
    println!("Manifest: {}", summary.outputs.manifest_path.display());

    let manifest = &summary.outputs.manifest;
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Format"),
        header_cell("Cells"),
        header_cell("Bytes"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for file in &manifest.files {
        table.add_row(vec![
            Cell::new(&file.file),
            format_cell(file.format),
            Cell::new(file.cell_count),
            dim_cell(file.bytes),
        ]);
    }
    table.add_row(vec![
        Cell::new(format!("TOTAL ({} tables)", summary.tables))
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!(
            "{} xlsx / {} docx ({} reports)",
            manifest.count(OutputFormat::Xlsx),
            manifest.count(OutputFormat::Docx),
            manifest.count_kind(OutputKind::Report)
        ))
        .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_issue_table(&summary.validation);
}

pub fn print_check_summary(summary: &CheckSummary) {
    println!("Dataset: {} ({} rows)", summary.dataset, summary.rows);
    println!("Validation report: {}", summary.report_path.display());
    let report = &summary.report;
    if report.is_empty() {
        println!("No issues found.");
    } else {
        println!(
            "{} error(s), {} warning(s)",
            report.error_count(),
            report.warning_count()
        );
    }
    print_issue_table(report);
}

pub fn print_rejection(report: &ValidationReport) {
    eprintln!(
        "Validation of '{}' failed with {} error(s); no tables were written.",
        report.dataset,
        report.error_count()
    );
    print_issue_table(report);
}

/// Issues sorted by severity, errors first.
pub fn print_issue_table(report: &ValidationReport) {
    if report.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Category"),
        header_cell("Variable"),
        header_cell("Count"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for issue in report.sorted_by_severity() {
        table.add_row(issue_row(issue));
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn issue_row(issue: &Issue) -> Vec<Cell> {
    let severity = issue.severity();
    vec![
        severity_cell(severity),
        Cell::new(issue.category().label()),
        issue.variable().map_or_else(|| dim_cell("-"), Cell::new),
        match issue.count() {
            Some(count) => Cell::new(count).fg(severity_color(severity)),
            None => dim_cell("-"),
        },
        Cell::new(issue.message()),
    ]
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Percentage(70)),
        ColumnConstraint::LowerBoundary(Width::Fixed(6)),
    ]);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    table.set_constraints(vec![
        ColumnConstraint::UpperBoundary(Width::Fixed(9)),
        ColumnConstraint::UpperBoundary(Width::Fixed(14)),
        ColumnConstraint::UpperBoundary(Width::Fixed(16)),
        ColumnConstraint::LowerBoundary(Width::Fixed(5)),
        ColumnConstraint::UpperBoundary(Width::Percentage(60)),
    ]);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn format_cell(format: OutputFormat) -> Cell {
    match format {
        OutputFormat::Xlsx => Cell::new(format).fg(Color::Green),
        OutputFormat::Docx => Cell::new(format).fg(Color::Blue),
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
