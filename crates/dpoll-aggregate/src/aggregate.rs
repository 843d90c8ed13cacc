//! Weighted cell statistics and comparisons for one table request.

use rayon::prelude::*;
use tracing::{debug, info};

use dpoll_model::{
    AnalysisOptions, Cell, CellStats, Code, Comparison, ComparisonKind, ComparisonStats,
    ComparisonTable, Design, MatchedUnit, Metadata, Statistic, TableRequest, Variable,
    VariableRole, WeightSpec,
};

use crate::error::{AggregateError, Result};
use crate::inference::{chi_square_association, paired_t_test, welch_t_test};

/// One unit's contribution to a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Observation {
    value: f64,
    weight: f64,
    /// Nominal category at the same time; `None` without a breakdown or when
    /// the unit's category is missing.
    category: Option<Code>,
}

/// Resolved request: variable names plus the code lists they expose.
struct Layout<'a> {
    request: &'a TableRequest,
    ordinal: &'a Variable,
    breakdown: Option<&'a Variable>,
    ordinal_codes: Vec<Code>,
    categories: Vec<Code>,
    options: &'a AnalysisOptions,
}

impl<'a> Layout<'a> {
    fn resolve(
        metadata: &'a Metadata,
        request: &'a TableRequest,
        options: &'a AnalysisOptions,
    ) -> Result<Self> {
        let ordinal = require_role(metadata, &request.ordinal, VariableRole::Ordinal)?;
        let breakdown = request
            .breakdown
            .as_deref()
            .map(|name| require_role(metadata, name, VariableRole::Nominal))
            .transpose()?;
        if let Some(name) = request.weight.variable() {
            require_role(metadata, name, VariableRole::Weight)?;
        }

        Ok(Self {
            request,
            ordinal,
            breakdown,
            ordinal_codes: substantive_codes(ordinal, options),
            categories: breakdown.map_or_else(Vec::new, |v| substantive_codes(v, options)),
            options,
        })
    }

    /// The unit's observation at `time`, if it has a valid ordinal value and
    /// a usable weight there.
    fn observe(&self, unit: &MatchedUnit, time: Code) -> Option<Observation> {
        let value = unit.value(time, &self.ordinal.name)?;
        let code = Code::new(value)?;
        if self.options.is_sentinel(&self.ordinal.name, code) {
            return None;
        }
        let weight = match &self.request.weight {
            WeightSpec::Unweighted => 1.0,
            WeightSpec::Variable(name) => unit.value(time, name)?,
        };
        if !weight.is_finite() || weight < 0.0 {
            return None;
        }
        let category = self.breakdown.and_then(|nominal| {
            let code = Code::new(unit.value(time, &nominal.name)?)?;
            self.categories.contains(&code).then_some(code)
        });
        Some(Observation {
            value,
            weight,
            category,
        })
    }

    fn cell_stats<'o>(&self, observations: impl Iterator<Item = &'o Observation>) -> CellStats {
        let mut unweighted_n = 0;
        let mut total = 0.0;
        let mut weighted_sum = 0.0;
        let mut per_code = vec![0.0; self.ordinal_codes.len()];
        for obs in observations {
            unweighted_n += 1;
            total += obs.weight;
            weighted_sum += obs.weight * obs.value;
            if let Some(slot) = self.code_index(obs.value) {
                per_code[slot] += obs.weight;
            }
        }
        CellStats {
            unweighted_n,
            weighted_n: total,
            mean: Statistic::ratio(weighted_sum, total),
            distribution: self
                .ordinal_codes
                .iter()
                .zip(per_code)
                .map(|(&code, weight)| (code, Statistic::ratio(weight, total)))
                .collect(),
        }
    }

    fn code_index(&self, value: f64) -> Option<usize> {
        let code = Code::new(value)?;
        self.ordinal_codes.iter().position(|c| *c == code)
    }
}

pub(crate) fn require_role<'a>(
    metadata: &'a Metadata,
    name: &str,
    expected: VariableRole,
) -> Result<&'a Variable> {
    let variable = metadata.require(name)?;
    if variable.has_role(expected) {
        Ok(variable)
    } else {
        Err(AggregateError::WrongRole {
            variable: name.to_string(),
            expected,
            actual: variable.role,
        })
    }
}

/// Declared codes that are not configured as missing-data sentinels.
pub(crate) fn substantive_codes(variable: &Variable, options: &AnalysisOptions) -> Vec<Code> {
    variable
        .value_labels
        .keys()
        .copied()
        .filter(|code| !options.is_sentinel(&variable.name, *code))
        .collect()
}

pub(crate) fn difference(left: Statistic, right: Statistic) -> Statistic {
    match (left, right) {
        (Statistic::Defined(l), Statistic::Defined(r)) => Statistic::from_value(r - l),
        _ => Statistic::Undefined,
    }
}

fn distribution_difference(left: &CellStats, right: &CellStats) -> Vec<(Code, Statistic)> {
    left.distribution
        .iter()
        .map(|(code, share)| (*code, difference(*share, right.share(*code))))
        .collect()
}

fn pairs_of(observations: &[Observation]) -> Vec<(f64, f64)> {
    observations.iter().map(|o| (o.value, o.weight)).collect()
}

/// Observations of one (group, time) cell.
struct CellObservations {
    group: Code,
    time: Code,
    observations: Vec<Observation>,
}

/// Computes one comparison table.
///
/// Cells are laid out groups outer, times inner, in first-appearance order.
/// Comparisons follow: for each group, the baseline time against each later
/// time (paired); then for each time, every pair of groups (independent).
pub fn aggregate(
    units: &[MatchedUnit],
    design: &Design,
    metadata: &Metadata,
    request: &TableRequest,
    options: &AnalysisOptions,
) -> Result<ComparisonTable> {
    let layout = Layout::resolve(metadata, request, options)?;
    let baseline = design.baseline().ok_or(AggregateError::EmptyDesign)?;

    let observed: Vec<CellObservations> = design
        .groups
        .iter()
        .flat_map(|&group| design.times.iter().map(move |&time| (group, time)))
        .map(|(group, time)| CellObservations {
            group,
            time,
            observations: units
                .iter()
                .filter(|unit| unit.group == group)
                .filter_map(|unit| layout.observe(unit, time))
                .collect(),
        })
        .collect();

    let cells: Vec<Cell> = observed.iter().map(|cell| build_cell(&layout, cell)).collect();

    let mut comparisons = Vec::new();
    for &group in &design.groups {
        for &later in design.times.iter().filter(|t| **t != baseline) {
            comparisons.push(paired_comparison(&layout, units, group, baseline, later));
        }
    }
    for &time in &design.times {
        for (i, &left) in design.groups.iter().enumerate() {
            for &right in &design.groups[i + 1..] {
                let find = |group: Code| {
                    observed
                        .iter()
                        .find(|c| c.group == group && c.time == time)
                        .map_or(&[][..], |c| c.observations.as_slice())
                };
                comparisons.push(between_comparison(
                    &layout,
                    ComparisonKind::Between { time, left, right },
                    find(left),
                    find(right),
                ));
            }
        }
    }

    debug!(
        table = %request,
        cells = cells.len(),
        comparisons = comparisons.len(),
        "table aggregated"
    );

    Ok(ComparisonTable {
        request: request.clone(),
        ordinal_codes: layout.ordinal_codes,
        categories: layout.categories,
        cells,
        comparisons,
    })
}

fn build_cell(layout: &Layout<'_>, cell: &CellObservations) -> Cell {
    let categories = layout
        .categories
        .iter()
        .map(|&code| {
            let members = cell.observations.iter().filter(|o| o.category == Some(code));
            (code, layout.cell_stats(members))
        })
        .collect();
    Cell {
        group: cell.group,
        time: cell.time,
        all: layout.cell_stats(cell.observations.iter()),
        categories,
    }
}

fn paired_comparison(
    layout: &Layout<'_>,
    units: &[MatchedUnit],
    group: Code,
    baseline: Code,
    later: Code,
) -> Comparison {
    // Both sides carry the baseline weight and baseline category.
    let pairs: Vec<(Observation, Observation)> = units
        .iter()
        .filter(|unit| unit.group == group)
        .filter_map(|unit| {
            let before = layout.observe(unit, baseline)?;
            let after = layout.observe(unit, later)?;
            Some((
                before,
                Observation {
                    weight: before.weight,
                    category: before.category,
                    ..after
                },
            ))
        })
        .collect();

    let paired_stats = |members: Vec<&(Observation, Observation)>| {
        let before = layout.cell_stats(members.iter().map(|(b, _)| b));
        let after = layout.cell_stats(members.iter().map(|(_, a)| a));
        let differences: Vec<(f64, f64)> = members
            .iter()
            .map(|(b, a)| (a.value - b.value, b.weight))
            .collect();
        let weighted: f64 = differences.iter().map(|(d, w)| d * w).sum();
        ComparisonStats {
            n: members.len(),
            mean_difference: Statistic::ratio(weighted, before.weighted_n),
            distribution_difference: distribution_difference(&before, &after),
            test: paired_t_test(&differences),
        }
    };

    let all = paired_stats(pairs.iter().collect());
    let categories = layout
        .categories
        .iter()
        .map(|&code| {
            let members = pairs.iter().filter(|(b, _)| b.category == Some(code)).collect();
            (code, paired_stats(members))
        })
        .collect();

    let association = layout.breakdown.and_then(|_| {
        let side = |time: Code| -> Vec<Observation> {
            units
                .iter()
                .filter(|unit| unit.group == group)
                .filter_map(|unit| layout.observe(unit, time))
                .collect()
        };
        association(layout, &side(baseline), &side(later))
    });

    Comparison {
        kind: ComparisonKind::Paired {
            group,
            baseline,
            later,
        },
        all,
        categories,
        association,
    }
}

fn between_comparison(
    layout: &Layout<'_>,
    kind: ComparisonKind,
    left: &[Observation],
    right: &[Observation],
) -> Comparison {
    let independent_stats = |left: Vec<Observation>, right: Vec<Observation>| {
        let left_stats = layout.cell_stats(left.iter());
        let right_stats = layout.cell_stats(right.iter());
        ComparisonStats {
            n: left.len() + right.len(),
            mean_difference: difference(left_stats.mean, right_stats.mean),
            distribution_difference: distribution_difference(&left_stats, &right_stats),
            test: welch_t_test(&pairs_of(&left), &pairs_of(&right)),
        }
    };

    let all = independent_stats(left.to_vec(), right.to_vec());
    let categories = layout
        .categories
        .iter()
        .map(|&code| {
            let in_category = |side: &[Observation]| {
                side.iter()
                    .copied()
                    .filter(|o| o.category == Some(code))
                    .collect::<Vec<_>>()
            };
            (code, independent_stats(in_category(left), in_category(right)))
        })
        .collect();

    Comparison {
        kind,
        all,
        categories,
        association: layout
            .breakdown
            .and_then(|_| association(layout, left, right)),
    }
}

/// Chi-square test of nominal category against comparison side.
fn association(
    layout: &Layout<'_>,
    left: &[Observation],
    right: &[Observation],
) -> Option<dpoll_model::AssociationTest> {
    let weight_in = |side: &[Observation], code: Code| -> f64 {
        side.iter()
            .filter(|o| o.category == Some(code))
            .map(|o| o.weight)
            .sum()
    };
    let counts: Vec<[f64; 2]> = layout
        .categories
        .iter()
        .map(|&code| [weight_in(left, code), weight_in(right, code)])
        .collect();
    chi_square_association(&counts)
}

/// Computes every request, in parallel when `options.parallel` is set.
/// Output order matches `requests`.
pub fn aggregate_all(
    units: &[MatchedUnit],
    design: &Design,
    metadata: &Metadata,
    requests: &[TableRequest],
    options: &AnalysisOptions,
) -> Result<Vec<ComparisonTable>> {
    aggregate_all_with_progress(units, design, metadata, requests, options, |_| {})
}

/// Like [`aggregate_all`], calling `on_table` after each table completes.
pub fn aggregate_all_with_progress<F>(
    units: &[MatchedUnit],
    design: &Design,
    metadata: &Metadata,
    requests: &[TableRequest],
    options: &AnalysisOptions,
    on_table: F,
) -> Result<Vec<ComparisonTable>>
where
    F: Fn(&TableRequest) + Sync,
{
    info!(
        tables = requests.len(),
        units = units.len(),
        parallel = options.parallel,
        "aggregating tables"
    );
    run_requests(requests, options.parallel, on_table, |request| {
        aggregate(units, design, metadata, request, options)
    })
}

/// Maps `compute` over `requests`, on the rayon pool when `parallel` is set,
/// keeping request order in the output.
pub(crate) fn run_requests<R, T, C, F>(
    requests: &[R],
    parallel: bool,
    on_done: F,
    compute: C,
) -> Result<Vec<T>>
where
    R: Sync,
    T: Send,
    C: Fn(&R) -> Result<T> + Sync,
    F: Fn(&R) + Sync,
{
    let run = |request: &R| {
        let table = compute(request);
        on_done(request);
        table
    };
    if parallel {
        requests.par_iter().map(run).collect()
    } else {
        requests.iter().map(run).collect()
    }
}
