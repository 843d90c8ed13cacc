//! Plain-language summaries of comparison tables.
//!
//! One report per (breakdown, weight) pair lists every ordinal variable and
//! comparison with a statement of how the average response moved and which
//! answer led on each side.

use serde::Serialize;

use dpoll_aggregate::weight_label;
use dpoll_model::{
    AnalysisOptions, CellStats, Code, ComparisonKind, ComparisonStats, ComparisonTable, Metadata,
    VariableRole, WeightSpec,
};

use crate::assemble::{ALL_RESPONDENTS, comparison_label, design_label, variable_label};
use crate::format::sanitize_file_name;

pub const INSUFFICIENT_DATA: &str = "Insufficient data to generate prose summary.";

/// How dominant the leading response is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Prevalence {
    /// Under half.
    Plurality,
    /// Half up to two thirds.
    Majority,
    /// Over two thirds.
    Supermajority,
}

impl Prevalence {
    pub fn of(share: f64) -> Self {
        if share < 0.5 {
            Self::Plurality
        } else if share > 2.0 / 3.0 {
            Self::Supermajority
        } else {
            Self::Majority
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plurality => "plurality",
            Self::Majority => "majority",
            Self::Supermajority => "supermajority",
        }
    }
}

/// One statement: an ordinal variable under one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProseEntry {
    pub variable: String,
    pub comparison: String,
    pub statement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProseReport {
    pub title: String,
    pub file_stem: String,
    pub entries: Vec<ProseEntry>,
}

/// The most chosen answer of a cell; ties go to the lower code.
#[derive(Debug, Clone, PartialEq)]
struct Leading {
    label: String,
    share: f64,
    prevalence: Prevalence,
}

impl Leading {
    fn of(stats: &CellStats, code_labels: &[(Code, String)]) -> Option<Self> {
        let mut best: Option<(&str, f64)> = None;
        for (code, label) in code_labels {
            let Some(share) = stats.share(*code).value() else {
                continue;
            };
            if best.is_none_or(|(_, top)| share > top) {
                best = Some((label.as_str(), share));
            }
        }
        best.map(|(label, share)| Self {
            label: label.to_string(),
            share,
            prevalence: Prevalence::of(share),
        })
    }

    fn describe(&self) -> String {
        format!(
            "a {} response of \"{}\" ({:.1}%)",
            self.prevalence.as_str(),
            self.label,
            self.share * 100.0
        )
    }
}

/// "like (40.0%)" when both sides lead with the same prevalence, otherwise
/// "unlike a majority response of ...".
fn compare_leading(earlier: &Leading, later: &Leading) -> (&'static str, String) {
    if earlier.prevalence == later.prevalence {
        ("like", format!("({:.1}%)", earlier.share * 100.0))
    } else {
        ("unlike", earlier.describe())
    }
}

fn p_suffix(stats: &ComparisonStats) -> String {
    stats
        .test
        .map_or_else(String::new, |t| format!(" (P = {:.3})", t.p_value))
}

/// How the mean moved, or `None` when the difference is undefined.
fn mean_change(stats: &ComparisonStats, paired: bool, significance_level: f64) -> Option<String> {
    let value = stats.mean_difference.value()?;
    let significant = stats.test.is_some_and(|t| t.p_value < significance_level);
    let phrase = match (paired, significant) {
        (true, true) => {
            let direction = if value < 0.0 {
                "decreased"
            } else if value > 0.0 {
                "increased"
            } else {
                "did not change"
            };
            format!("{direction} significantly by {value:.3}{}", p_suffix(stats))
        }
        (true, false) => format!("did not change significantly{}", p_suffix(stats)),
        (false, true) => format!(
            "was a significant difference of {value:.3}{}",
            p_suffix(stats)
        ),
        (false, false) => format!("was not a significant difference{}", p_suffix(stats)),
    };
    Some(phrase)
}

/// One population of a comparison: both cells and the difference stats.
struct Sides<'a> {
    /// `None` for the whole cell, else the category label.
    category: Option<String>,
    left: &'a CellStats,
    right: &'a CellStats,
    stats: &'a ComparisonStats,
}

struct Summarizer<'a> {
    metadata: &'a Metadata,
    variable_label: String,
    code_labels: Vec<(Code, String)>,
    significance_level: f64,
}

impl Summarizer<'_> {
    fn group(&self, code: Code) -> String {
        design_label(self.metadata, VariableRole::GroupMarker, code)
    }

    fn time(&self, code: Code) -> String {
        design_label(self.metadata, VariableRole::TimeMarker, code)
    }

    fn paired(
        &self,
        group: Code,
        baseline: Code,
        later: Code,
        sides: &Sides<'_>,
    ) -> Option<String> {
        let change = mean_change(sides.stats, true, self.significance_level)?;
        let (group, baseline, later) = (self.group(group), self.time(baseline), self.time(later));
        let mut text = match &sides.category {
            None => format!(
                "{group} (n = {}) responded to the statement, \"{}\". The average response \
                 {change} between {baseline} and {later}.",
                sides.stats.n, self.variable_label
            ),
            Some(category) => format!(
                "Among those who selected \"{category}\" (n = {}), the average response \
                 {change} between {baseline} and {later}.",
                sides.stats.n
            ),
        };
        if let (Some(before), Some(after)) = (
            Leading::of(sides.left, &self.code_labels),
            Leading::of(sides.right, &self.code_labels),
        ) {
            let (likeness, before) = compare_leading(&before, &after);
            text.push_str(&format!(
                " At {later}, there was {} among this group, {likeness} at {baseline} {before}.",
                after.describe()
            ));
        }
        Some(text)
    }

    fn between(&self, time: Code, left: Code, right: Code, sides: &Sides<'_>) -> Option<String> {
        let change = mean_change(sides.stats, false, self.significance_level)?;
        let time = self.time(time);
        let (left, right) = (self.group(left), self.group(right));
        let mut text = match &sides.category {
            None => format!(
                "{left} at {time} and {right} at {time} responded to the statement, \"{}\". \
                 There {change} in the average response between {left} at {time} (n = {}) \
                 and {right} at {time} (n = {}).",
                self.variable_label, sides.left.unweighted_n, sides.right.unweighted_n
            ),
            Some(category) => format!(
                "Among those who selected \"{category}\", there {change} in the average \
                 response between {left} at {time} (n = {}) and {right} at {time} (n = {}).",
                sides.left.unweighted_n, sides.right.unweighted_n
            ),
        };
        if let (Some(first), Some(second)) = (
            Leading::of(sides.left, &self.code_labels),
            Leading::of(sides.right, &self.code_labels),
        ) {
            let (likeness, first) = compare_leading(&first, &second);
            text.push_str(&format!(
                " Among {right}, there was {}, {likeness} {left} {first}.",
                second.describe()
            ));
        }
        Some(text)
    }

    fn statement(&self, kind: ComparisonKind, sides: &Sides<'_>) -> Option<String> {
        match kind {
            ComparisonKind::Paired {
                group,
                baseline,
                later,
            } => self.paired(group, baseline, later, sides),
            ComparisonKind::Between { time, left, right } => {
                self.between(time, left, right, sides)
            }
        }
    }
}

fn side_cells(kind: ComparisonKind) -> ((Code, Code), (Code, Code)) {
    match kind {
        ComparisonKind::Paired {
            group,
            baseline,
            later,
        } => ((group, baseline), (group, later)),
        ComparisonKind::Between { time, left, right } => ((left, time), (right, time)),
    }
}

/// One entry per comparison of `table`.
fn summarize_table(
    table: &ComparisonTable,
    metadata: &Metadata,
    options: &AnalysisOptions,
) -> Vec<ProseEntry> {
    let request = &table.request;
    let summarizer = Summarizer {
        metadata,
        variable_label: variable_label(metadata, &request.ordinal),
        code_labels: table
            .ordinal_codes
            .iter()
            .map(|&code| (code, metadata.label_for(&request.ordinal, code)))
            .collect(),
        significance_level: options.significance_level,
    };

    table
        .comparisons
        .iter()
        .map(|comparison| {
            let ((lg, lt), (rg, rt)) = side_cells(comparison.kind);
            let mut sentences = Vec::new();
            if let (Some(left), Some(right)) = (table.cell(lg, lt), table.cell(rg, rt)) {
                let whole = Sides {
                    category: None,
                    left: &left.all,
                    right: &right.all,
                    stats: &comparison.all,
                };
                sentences.extend(summarizer.statement(comparison.kind, &whole));
                if let Some(nominal) = &request.breakdown {
                    for &category in &table.categories {
                        let (Some(l), Some(r), Some(stats)) = (
                            left.category(category),
                            right.category(category),
                            comparison.category(category),
                        ) else {
                            continue;
                        };
                        let sides = Sides {
                            category: Some(metadata.label_for(nominal, category)),
                            left: l,
                            right: r,
                            stats,
                        };
                        sentences.extend(summarizer.statement(comparison.kind, &sides));
                    }
                }
            }
            let statement = if sentences.is_empty() {
                INSUFFICIENT_DATA.to_string()
            } else {
                sentences.join(" ")
            };
            ProseEntry {
                variable: request.ordinal.clone(),
                comparison: comparison_label(metadata, &comparison.kind),
                statement,
            }
        })
        .collect()
}

/// Groups tables by (breakdown, weight) in first-appearance order and
/// summarizes each group as one report.
pub fn summarize(
    tables: &[ComparisonTable],
    metadata: &Metadata,
    options: &AnalysisOptions,
) -> Vec<ProseReport> {
    let mut keys: Vec<(Option<&str>, &WeightSpec)> = Vec::new();
    let mut reports: Vec<ProseReport> = Vec::new();
    for table in tables {
        let key = (table.request.breakdown.as_deref(), &table.request.weight);
        let index = match keys.iter().position(|k| *k == key) {
            Some(index) => index,
            None => {
                let title = format!(
                    "{} ({})",
                    key.0.map_or_else(
                        || ALL_RESPONDENTS.to_string(),
                        |name| variable_label(metadata, name)
                    ),
                    weight_label(metadata, key.1)
                );
                keys.push(key);
                reports.push(ProseReport {
                    file_stem: sanitize_file_name(&format!("Report - {title}")),
                    title,
                    entries: Vec::new(),
                });
                reports.len() - 1
            }
        };
        reports[index]
            .entries
            .extend(summarize_table(table, metadata, options));
    }
    reports
}
