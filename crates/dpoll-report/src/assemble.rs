//! Lays computed comparison tables out as labeled rows and columns.
//!
//! No statistic is computed here. Columns follow the design order of the
//! cells and comparisons; rows are grouped into an "All respondents" block
//! followed by one block per nominal category. Prose reports are built from
//! the same tables.

use tracing::debug;

use dpoll_aggregate::weight_label;
use dpoll_model::{
    AnalysisOptions, AssociationTest, CellStats, Code, Comparison, ComparisonKind,
    ComparisonStats, ComparisonTable, DistributionTable, Metadata, Statistic, VariableRole,
};

use crate::format::{sanitize_file_name, sheet_name};
use crate::prose::summarize;
use crate::table::{AssembledTable, OutputTableSet, TableRow, TableValue};

pub const ALL_RESPONDENTS: &str = "All respondents";
pub const UNWEIGHTED_N_ROW: &str = "Unweighted n";
pub const WEIGHTED_N_ROW: &str = "Weighted n";
pub const MEAN_ROW: &str = "Mean";
pub const CHI_SQUARE_ROW: &str = "Chi-square test";

pub fn assemble(
    tables: &[ComparisonTable],
    metadata: &Metadata,
    options: &AnalysisOptions,
) -> OutputTableSet {
    let assembled: Vec<AssembledTable> = tables
        .iter()
        .map(|table| assemble_table(table, metadata, options))
        .collect();
    let reports = summarize(tables, metadata, options);
    debug!(
        tables = assembled.len(),
        reports = reports.len(),
        "tables assembled"
    );
    OutputTableSet {
        tables: assembled,
        reports,
    }
}

/// Lays out nominal distribution tables, one per request.
pub fn assemble_distributions(
    tables: &[DistributionTable],
    metadata: &Metadata,
) -> Vec<AssembledTable> {
    let assembled: Vec<AssembledTable> = tables
        .iter()
        .map(|table| assemble_distribution(table, metadata))
        .collect();
    debug!(tables = assembled.len(), "distributions assembled");
    assembled
}

pub(crate) fn design_label(metadata: &Metadata, role: VariableRole, code: Code) -> String {
    metadata
        .by_role(role)
        .next()
        .map_or_else(|| code.to_string(), |v| v.label_for(code))
}

pub(crate) fn variable_label(metadata: &Metadata, name: &str) -> String {
    metadata
        .variable(name)
        .map_or_else(|| name.to_string(), |v| v.display_label().to_string())
}

pub(crate) fn comparison_label(metadata: &Metadata, kind: &ComparisonKind) -> String {
    let group = |code| design_label(metadata, VariableRole::GroupMarker, code);
    let time = |code| design_label(metadata, VariableRole::TimeMarker, code);
    match *kind {
        ComparisonKind::Paired {
            group: g,
            baseline,
            later,
        } => format!("{} at {} v. {}", group(g), time(baseline), time(later)),
        ComparisonKind::Between {
            time: t,
            left,
            right,
        } => format!("{} v. {} at {}", group(left), group(right), time(t)),
    }
}

fn statistic(stat: Statistic, render: impl FnOnce(f64) -> TableValue) -> TableValue {
    stat.value().map_or(TableValue::Undefined, render)
}

fn difference(stats: &ComparisonStats, significance_level: f64) -> TableValue {
    statistic(stats.mean_difference, |value| {
        let p_value = stats.test.map(|t| t.p_value);
        TableValue::Difference {
            value,
            p_value,
            significant: p_value.is_some_and(|p| p < significance_level),
        }
    })
}

/// Rows of one block: sizes, mean, then one share per ordinal code.
fn block_rows(
    block: &str,
    code_labels: &[(Code, String)],
    cells: &[&CellStats],
    comparisons: &[&ComparisonStats],
    significance_level: f64,
) -> Vec<TableRow> {
    let row = |label: &str,
               cell: &dyn Fn(&CellStats) -> TableValue,
               comparison: &dyn Fn(&ComparisonStats) -> TableValue| TableRow {
        block: block.to_string(),
        label: label.to_string(),
        values: cells
            .iter()
            .map(|c| cell(*c))
            .chain(comparisons.iter().map(|c| comparison(*c)))
            .collect(),
    };

    let mut rows = vec![
        row(
            UNWEIGHTED_N_ROW,
            &|c| TableValue::Count(c.unweighted_n),
            &|c| TableValue::Count(c.n),
        ),
        row(
            WEIGHTED_N_ROW,
            &|c| TableValue::Number(c.weighted_n),
            &|_| TableValue::Empty,
        ),
        row(
            MEAN_ROW,
            &|c| statistic(c.mean, TableValue::Number),
            &|c| difference(c, significance_level),
        ),
    ];
    for (code, label) in code_labels {
        rows.push(row(
            label.as_str(),
            &|c| statistic(c.share(*code), TableValue::Percent),
            &|c| statistic(c.share_difference(*code), TableValue::Percent),
        ));
    }
    rows
}

fn association_value(association: Option<AssociationTest>) -> TableValue {
    match association {
        Some(test) if test.sparse_expected => TableValue::Text(format!(
            "P = {:.3} (expected count below 5)",
            test.result.p_value
        )),
        Some(test) => TableValue::Text(format!("P = {:.3}", test.result.p_value)),
        None => TableValue::Undefined,
    }
}

fn association_row(
    breakdown_label: &str,
    cell_columns: usize,
    comparisons: &[Comparison],
) -> TableRow {
    let values = std::iter::repeat_n(TableValue::Empty, cell_columns)
        .chain(comparisons.iter().map(|c| association_value(c.association)))
        .collect();
    TableRow {
        block: ALL_RESPONDENTS.to_string(),
        label: format!("Association with {breakdown_label}"),
        values,
    }
}

fn assemble_table(
    table: &ComparisonTable,
    metadata: &Metadata,
    options: &AnalysisOptions,
) -> AssembledTable {
    let request = &table.request;
    let ordinal_label = variable_label(metadata, &request.ordinal);
    let breakdown_label = request
        .breakdown
        .as_deref()
        .map(|name| variable_label(metadata, name));
    let title = format!(
        "{} - {} ({})",
        ordinal_label,
        breakdown_label.as_deref().unwrap_or(ALL_RESPONDENTS),
        weight_label(metadata, &request.weight)
    );

    let columns = column_labels(
        metadata,
        table.cells.iter().map(|c| (c.group, c.time)),
        table.comparisons.iter().map(|c| &c.kind),
    );

    let code_labels: Vec<(Code, String)> = table
        .ordinal_codes
        .iter()
        .map(|&code| (code, metadata.label_for(&request.ordinal, code)))
        .collect();
    let level = options.significance_level;

    let all_cells: Vec<&CellStats> = table.cells.iter().map(|c| &c.all).collect();
    let all_comparisons: Vec<&ComparisonStats> =
        table.comparisons.iter().map(|c| &c.all).collect();
    let mut rows = block_rows(
        ALL_RESPONDENTS,
        &code_labels,
        &all_cells,
        &all_comparisons,
        level,
    );
    if let Some(label) = &breakdown_label {
        rows.push(association_row(label, table.cells.len(), &table.comparisons));
    }

    if let Some(nominal) = &request.breakdown {
        for &category in &table.categories {
            let cells: Vec<&CellStats> = table
                .cells
                .iter()
                .filter_map(|c| c.category(category))
                .collect();
            let comparisons: Vec<&ComparisonStats> = table
                .comparisons
                .iter()
                .filter_map(|c| c.category(category))
                .collect();
            let block = metadata.label_for(nominal, category);
            rows.extend(block_rows(&block, &code_labels, &cells, &comparisons, level));
        }
    }

    let file_stem = sanitize_file_name(&format!("Tables - {title}"));
    let sheet = sheet_name(&title);
    AssembledTable::new(title, file_stem, sheet, columns, rows)
}

/// "Group at Time" per cell, then one label per comparison.
fn column_labels<'a>(
    metadata: &Metadata,
    cells: impl Iterator<Item = (Code, Code)>,
    comparisons: impl Iterator<Item = &'a ComparisonKind>,
) -> Vec<String> {
    cells
        .map(|(group, time)| {
            format!(
                "{} at {}",
                design_label(metadata, VariableRole::GroupMarker, group),
                design_label(metadata, VariableRole::TimeMarker, time)
            )
        })
        .chain(comparisons.map(|kind| comparison_label(metadata, kind)))
        .collect()
}

fn assemble_distribution(table: &DistributionTable, metadata: &Metadata) -> AssembledTable {
    let request = &table.request;
    let title = format!(
        "{} - Distribution ({})",
        variable_label(metadata, &request.nominal),
        weight_label(metadata, &request.weight)
    );
    let columns = column_labels(
        metadata,
        table.cells.iter().map(|c| (c.group, c.time)),
        table.comparisons.iter().map(|c| &c.kind),
    );

    let row = |label: &str, values: Vec<TableValue>| TableRow {
        block: ALL_RESPONDENTS.to_string(),
        label: label.to_string(),
        values,
    };
    let mut rows = vec![
        row(
            UNWEIGHTED_N_ROW,
            table
                .cells
                .iter()
                .map(|c| TableValue::Count(c.unweighted_n))
                .chain(table.comparisons.iter().map(|c| TableValue::Count(c.n)))
                .collect(),
        ),
        row(
            WEIGHTED_N_ROW,
            table
                .cells
                .iter()
                .map(|c| TableValue::Number(c.weighted_n))
                .chain(table.comparisons.iter().map(|_| TableValue::Empty))
                .collect(),
        ),
    ];
    for &category in &table.categories {
        let values = table
            .cells
            .iter()
            .map(|cell| match (cell.count(category), cell.share(category).value()) {
                (Some(count), Some(share)) => TableValue::Frequency { count, share },
                _ => TableValue::Undefined,
            })
            .chain(
                table
                    .comparisons
                    .iter()
                    .map(|c| statistic(c.share_difference(category), TableValue::Percent)),
            )
            .collect();
        rows.push(row(&metadata.label_for(&request.nominal, category), values));
    }
    rows.push(row(
        CHI_SQUARE_ROW,
        std::iter::repeat_n(TableValue::Empty, table.cells.len())
            .chain(table.comparisons.iter().map(|c| association_value(c.association)))
            .collect(),
    ));

    let file_stem = sanitize_file_name(&format!("Tables - {title}"));
    let sheet = sheet_name(&title);
    AssembledTable::new(title, file_stem, sheet, columns, rows)
}
