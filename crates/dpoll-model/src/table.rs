//! Comparison tables produced by the aggregator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::code::Code;

/// A per-cell statistic: either a value or explicitly undefined.
///
/// Undefined is a valid state (an empty or zero-weight cell), never an
/// error and never rendered as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Statistic {
    Defined(f64),
    Undefined,
}

impl Statistic {
    /// `Defined` for finite values, `Undefined` otherwise.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() {
            Self::Defined(value)
        } else {
            Self::Undefined
        }
    }

    /// `numerator / denominator`, undefined when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::Undefined
        } else {
            Self::from_value(numerator / denominator)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

/// Which weight a table is computed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightSpec {
    /// Constant weight 1 for every respondent.
    Unweighted,
    /// A Scale variable read from each respondent's record.
    Variable(String),
}

impl WeightSpec {
    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Unweighted => None,
            Self::Variable(name) => Some(name),
        }
    }
}

impl fmt::Display for WeightSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unweighted => f.write_str("Unweighted"),
            Self::Variable(name) => f.write_str(name),
        }
    }
}

/// One table to compute: ordinal variable, optional breakdown, weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRequest {
    pub ordinal: String,
    pub breakdown: Option<String>,
    pub weight: WeightSpec,
}

impl TableRequest {
    pub fn new(ordinal: impl Into<String>, breakdown: Option<String>, weight: WeightSpec) -> Self {
        Self {
            ordinal: ordinal.into(),
            breakdown,
            weight,
        }
    }
}

impl fmt::Display for TableRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.breakdown {
            Some(nominal) => write!(f, "{} by {} ({})", self.ordinal, nominal, self.weight),
            None => write!(f, "{} ({})", self.ordinal, self.weight),
        }
    }
}

/// Statistics over the units contributing to one cell or sub-cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStats {
    /// Count of contributing units.
    pub unweighted_n: usize,
    /// Sum of their weights.
    pub weighted_n: f64,
    pub mean: Statistic,
    /// Share of total weight per declared ordinal code.
    pub distribution: Vec<(Code, Statistic)>,
}

impl CellStats {
    pub fn share(&self, code: Code) -> Statistic {
        self.distribution
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Statistic::Undefined, |(_, s)| *s)
    }
}

/// One (group, time) cell with its nominal sub-cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub group: Code,
    pub time: Code,
    pub all: CellStats,
    /// One entry per declared, non-sentinel nominal code; empty without a
    /// breakdown.
    pub categories: Vec<(Code, CellStats)>,
}

impl Cell {
    pub fn category(&self, code: Code) -> Option<&CellStats> {
        self.categories
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, s)| s)
    }
}

/// Two sides of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonKind {
    /// Same group, baseline time against a later time (matched units).
    Paired { group: Code, baseline: Code, later: Code },
    /// Same time, two groups (independent samples).
    Between { time: Code, left: Code, right: Code },
}

/// Result of a significance test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    pub df: f64,
    pub p_value: f64,
}

/// Chi-square association between nominal category and comparison side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociationTest {
    pub result: TestResult,
    /// Some expected count was below 5.
    pub sparse_expected: bool,
}

/// Difference statistics for one comparison over one population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStats {
    /// Units contributing: matched pairs, or left plus right.
    pub n: usize,
    /// Later minus baseline, or right minus left.
    pub mean_difference: Statistic,
    pub distribution_difference: Vec<(Code, Statistic)>,
    /// `None` when the test is degenerate.
    pub test: Option<TestResult>,
}

impl ComparisonStats {
    pub fn share_difference(&self, code: Code) -> Statistic {
        self.distribution_difference
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Statistic::Undefined, |(_, s)| *s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub kind: ComparisonKind,
    pub all: ComparisonStats,
    pub categories: Vec<(Code, ComparisonStats)>,
    /// Present only with a nominal breakdown.
    pub association: Option<AssociationTest>,
}

impl Comparison {
    pub fn category(&self, code: Code) -> Option<&ComparisonStats> {
        self.categories
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, s)| s)
    }
}

/// All statistics for one ordinal variable, breakdown and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub request: TableRequest,
    /// Declared ordinal codes that are not sentinels, ascending.
    pub ordinal_codes: Vec<Code>,
    /// Declared nominal codes that are not sentinels; empty without a
    /// breakdown.
    pub categories: Vec<Code>,
    /// Groups outer, times inner, both in first-appearance order.
    pub cells: Vec<Cell>,
    pub comparisons: Vec<Comparison>,
}

impl ComparisonTable {
    pub fn cell(&self, group: Code, time: Code) -> Option<&Cell> {
        self.cells.iter().find(|c| c.group == group && c.time == time)
    }

    pub fn has_breakdown(&self) -> bool {
        self.request.breakdown.is_some()
    }
}

/// One nominal variable's distribution under one weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistributionRequest {
    pub nominal: String,
    pub weight: WeightSpec,
}

impl DistributionRequest {
    pub fn new(nominal: impl Into<String>, weight: WeightSpec) -> Self {
        Self {
            nominal: nominal.into(),
            weight,
        }
    }
}

impl fmt::Display for DistributionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} distribution ({})", self.nominal, self.weight)
    }
}

/// Weighted category counts of one (group, time) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionCell {
    pub group: Code,
    pub time: Code,
    pub unweighted_n: usize,
    /// Sum of weights over every counted category.
    pub weighted_n: f64,
    /// One entry per declared, non-sentinel category.
    pub weighted_counts: Vec<(Code, f64)>,
}

impl DistributionCell {
    pub fn count(&self, category: Code) -> Option<f64> {
        self.weighted_counts
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, w)| *w)
    }

    /// Share of the cell's weight in `category`.
    pub fn share(&self, category: Code) -> Statistic {
        self.count(category)
            .map_or(Statistic::Undefined, |w| Statistic::ratio(w, self.weighted_n))
    }
}

/// Two cells' category distributions compared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionComparison {
    pub kind: ComparisonKind,
    /// Units counted on both sides together.
    pub n: usize,
    /// Later minus baseline, or right minus left.
    pub share_difference: Vec<(Code, Statistic)>,
    /// Chi-square test of category against side.
    pub association: Option<AssociationTest>,
}

impl DistributionComparison {
    pub fn share_difference(&self, category: Code) -> Statistic {
        self.share_difference
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(Statistic::Undefined, |(_, s)| *s)
    }
}

/// Frequency table of one nominal variable under one weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionTable {
    pub request: DistributionRequest,
    /// Declared nominal codes that are not sentinels, ascending.
    pub categories: Vec<Code>,
    /// Groups outer, times inner, both in first-appearance order.
    pub cells: Vec<DistributionCell>,
    pub comparisons: Vec<DistributionComparison>,
}

impl DistributionTable {
    pub fn cell(&self, group: Code, time: Code) -> Option<&DistributionCell> {
        self.cells.iter().find(|c| c.group == group && c.time == time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_with_zero_denominator_is_undefined() {
        assert_eq!(Statistic::ratio(3.0, 0.0), Statistic::Undefined);
        assert_eq!(Statistic::ratio(3.0, 2.0), Statistic::Defined(1.5));
        assert_eq!(Statistic::from_value(f64::NAN), Statistic::Undefined);
    }

    #[test]
    fn distribution_shares_follow_weighted_counts() {
        let cell = DistributionCell {
            group: Code::from(1),
            time: Code::from(1),
            unweighted_n: 3,
            weighted_n: 4.0,
            weighted_counts: vec![(Code::from(1), 1.0), (Code::from(2), 3.0)],
        };
        assert_eq!(cell.share(Code::from(2)), Statistic::Defined(0.75));
        assert_eq!(cell.share(Code::from(9)), Statistic::Undefined);

        let empty = DistributionCell {
            weighted_n: 0.0,
            weighted_counts: vec![(Code::from(1), 0.0)],
            ..cell
        };
        assert_eq!(empty.share(Code::from(1)), Statistic::Undefined);
    }

    #[test]
    fn distribution_request_display() {
        let request = DistributionRequest::new("Gender", WeightSpec::Variable("w".into()));
        assert_eq!(request.to_string(), "Gender distribution (w)");
    }

    #[test]
    fn request_display() {
        let request = TableRequest::new("Q1", Some("Gender".into()), WeightSpec::Unweighted);
        assert_eq!(request.to_string(), "Q1 by Gender (Unweighted)");
    }
}
