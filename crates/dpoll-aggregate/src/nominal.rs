//! Weighted category distributions of nominal variables.

use tracing::{debug, info};

use dpoll_model::{
    AnalysisOptions, Code, ComparisonKind, Design, DistributionCell, DistributionComparison,
    DistributionRequest, DistributionTable, MatchedUnit, Metadata, Variable, VariableRole,
    WeightSpec,
};

use crate::aggregate::{difference, require_role, run_requests, substantive_codes};
use crate::error::{AggregateError, Result};
use crate::inference::chi_square_association;

/// A unit's category and weight at one time.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Membership {
    category: Code,
    weight: f64,
}

struct NominalLayout<'a> {
    nominal: &'a Variable,
    weight: &'a WeightSpec,
    categories: Vec<Code>,
}

impl NominalLayout<'_> {
    /// Units without a declared, non-sentinel category or a usable weight
    /// at `time` are not counted.
    fn membership(&self, unit: &MatchedUnit, time: Code) -> Option<Membership> {
        let category = Code::new(unit.value(time, &self.nominal.name)?)?;
        if !self.categories.contains(&category) {
            return None;
        }
        let weight = match self.weight {
            WeightSpec::Unweighted => 1.0,
            WeightSpec::Variable(name) => unit.value(time, name)?,
        };
        (weight.is_finite() && weight >= 0.0).then_some(Membership { category, weight })
    }

    fn members(&self, units: &[MatchedUnit], group: Code, time: Code) -> Vec<Membership> {
        units
            .iter()
            .filter(|unit| unit.group == group)
            .filter_map(|unit| self.membership(unit, time))
            .collect()
    }

    fn weighted_counts(&self, members: &[Membership]) -> Vec<(Code, f64)> {
        self.categories
            .iter()
            .map(|&code| {
                let weight = members
                    .iter()
                    .filter(|m| m.category == code)
                    .map(|m| m.weight)
                    .sum();
                (code, weight)
            })
            .collect()
    }

    fn cell(&self, group: Code, time: Code, members: &[Membership]) -> DistributionCell {
        DistributionCell {
            group,
            time,
            unweighted_n: members.len(),
            weighted_n: members.iter().map(|m| m.weight).sum(),
            weighted_counts: self.weighted_counts(members),
        }
    }

    fn compare(
        &self,
        kind: ComparisonKind,
        left: &DistributionCell,
        right: &DistributionCell,
    ) -> DistributionComparison {
        let counts: Vec<[f64; 2]> = left
            .weighted_counts
            .iter()
            .zip(&right.weighted_counts)
            .map(|((_, l), (_, r))| [*l, *r])
            .collect();
        DistributionComparison {
            kind,
            n: left.unweighted_n + right.unweighted_n,
            share_difference: self
                .categories
                .iter()
                .map(|&code| (code, difference(left.share(code), right.share(code))))
                .collect(),
            association: chi_square_association(&counts),
        }
    }
}

/// Computes one nominal distribution table.
///
/// Cells and comparisons follow the same design order as comparison tables.
/// Both sides of a paired comparison count every unit of the group present
/// at that time, matched or not.
pub fn aggregate_distribution(
    units: &[MatchedUnit],
    design: &Design,
    metadata: &Metadata,
    request: &DistributionRequest,
    options: &AnalysisOptions,
) -> Result<DistributionTable> {
    let nominal = require_role(metadata, &request.nominal, VariableRole::Nominal)?;
    if let Some(name) = request.weight.variable() {
        require_role(metadata, name, VariableRole::Weight)?;
    }
    let baseline = design.baseline().ok_or(AggregateError::EmptyDesign)?;
    let layout = NominalLayout {
        nominal,
        weight: &request.weight,
        categories: substantive_codes(nominal, options),
    };

    let cells: Vec<DistributionCell> = design
        .groups
        .iter()
        .flat_map(|&group| design.times.iter().map(move |&time| (group, time)))
        .map(|(group, time)| layout.cell(group, time, &layout.members(units, group, time)))
        .collect();
    let find = |group: Code, time: Code| {
        cells
            .iter()
            .find(|c| c.group == group && c.time == time)
            .ok_or(AggregateError::EmptyDesign)
    };

    let mut comparisons = Vec::new();
    for &group in &design.groups {
        for &later in design.times.iter().filter(|t| **t != baseline) {
            comparisons.push(layout.compare(
                ComparisonKind::Paired {
                    group,
                    baseline,
                    later,
                },
                find(group, baseline)?,
                find(group, later)?,
            ));
        }
    }
    for &time in &design.times {
        for (i, &left) in design.groups.iter().enumerate() {
            for &right in &design.groups[i + 1..] {
                comparisons.push(layout.compare(
                    ComparisonKind::Between { time, left, right },
                    find(left, time)?,
                    find(right, time)?,
                ));
            }
        }
    }

    debug!(
        table = %request,
        cells = cells.len(),
        comparisons = comparisons.len(),
        "distribution aggregated"
    );
    Ok(DistributionTable {
        request: request.clone(),
        categories: layout.categories,
        cells,
        comparisons,
    })
}

/// Computes every distribution request, keeping request order.
pub fn aggregate_distributions(
    units: &[MatchedUnit],
    design: &Design,
    metadata: &Metadata,
    requests: &[DistributionRequest],
    options: &AnalysisOptions,
) -> Result<Vec<DistributionTable>> {
    aggregate_distributions_with_progress(units, design, metadata, requests, options, |_| {})
}

/// Like [`aggregate_distributions`], calling `on_table` after each table.
pub fn aggregate_distributions_with_progress<F>(
    units: &[MatchedUnit],
    design: &Design,
    metadata: &Metadata,
    requests: &[DistributionRequest],
    options: &AnalysisOptions,
    on_table: F,
) -> Result<Vec<DistributionTable>>
where
    F: Fn(&DistributionRequest) + Sync,
{
    info!(
        tables = requests.len(),
        units = units.len(),
        parallel = options.parallel,
        "aggregating distributions"
    );
    run_requests(requests, options.parallel, on_table, |request| {
        aggregate_distribution(units, design, metadata, request, options)
    })
}

