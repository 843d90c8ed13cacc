//! Weighted significance tests.
//!
//! Weights have frequency semantics: a weight of 2 counts as two identical
//! observations, so the effective sample size is the sum of weights.

use dpoll_model::{AssociationTest, TestResult};

use crate::distribution::{chi_square_survival, student_t_two_sided};

/// Expected counts below this make the chi-square approximation unreliable.
pub const SPARSE_EXPECTED_COUNT: f64 = 5.0;

/// Weighted mean and unbiased variance (`ddof = 1`) of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMoments {
    pub sum_weights: f64,
    pub mean: f64,
    /// `None` when `sum_weights <= 1`.
    pub variance: Option<f64>,
}

impl WeightedMoments {
    pub fn from_pairs(values: &[(f64, f64)]) -> Option<Self> {
        let sum_weights: f64 = values.iter().map(|(_, w)| w).sum();
        if sum_weights <= 0.0 {
            return None;
        }
        let mean = values.iter().map(|(v, w)| v * w).sum::<f64>() / sum_weights;
        let squares: f64 = values.iter().map(|(v, w)| w * (v - mean).powi(2)).sum();
        let variance = (sum_weights > 1.0).then(|| squares / (sum_weights - 1.0));
        Some(Self {
            sum_weights,
            mean,
            variance,
        })
    }

    /// Squared standard error of the mean.
    fn squared_error(&self) -> Option<f64> {
        self.variance.map(|v| v / self.sum_weights)
    }
}

fn finite_result(statistic: f64, df: f64, p_value: f64) -> Option<TestResult> {
    (statistic.is_finite() && df.is_finite() && df > 0.0 && p_value.is_finite()).then_some(
        TestResult {
            statistic,
            df,
            p_value,
        },
    )
}

/// One-sample weighted t-test of `mean == 0`, applied to paired differences.
///
/// `df = Σw − 1`. Returns `None` when the variance is zero or undefined.
pub fn paired_t_test(differences: &[(f64, f64)]) -> Option<TestResult> {
    let moments = WeightedMoments::from_pairs(differences)?;
    let squared_error = moments.squared_error()?;
    if squared_error <= 0.0 {
        return None;
    }
    let t = moments.mean / squared_error.sqrt();
    let df = moments.sum_weights - 1.0;
    finite_result(t, df, student_t_two_sided(t, df))
}

/// Welch two-sample weighted t-test (unequal variances).
///
/// The statistic is signed as `right − left`; degrees of freedom follow
/// Welch–Satterthwaite.
pub fn welch_t_test(left: &[(f64, f64)], right: &[(f64, f64)]) -> Option<TestResult> {
    let left = WeightedMoments::from_pairs(left)?;
    let right = WeightedMoments::from_pairs(right)?;
    let se_left = left.squared_error()?;
    let se_right = right.squared_error()?;
    let combined = se_left + se_right;
    if combined <= 0.0 {
        return None;
    }
    let t = (right.mean - left.mean) / combined.sqrt();
    let df = combined.powi(2)
        / (se_left.powi(2) / (left.sum_weights - 1.0) + se_right.powi(2) / (right.sum_weights - 1.0));
    finite_result(t, df, student_t_two_sided(t, df))
}

/// Pearson chi-square test on a categories × 2 table of weighted counts.
///
/// All-zero rows are dropped. With one degree of freedom the Yates
/// continuity correction is applied. `None` when fewer than two categories
/// remain or a side has no weight.
pub fn chi_square_association(counts: &[[f64; 2]]) -> Option<AssociationTest> {
    let rows: Vec<[f64; 2]> = counts
        .iter()
        .copied()
        .filter(|row| row.iter().any(|c| *c != 0.0))
        .collect();
    if rows.len() < 2 {
        return None;
    }
    let column_totals = [
        rows.iter().map(|r| r[0]).sum::<f64>(),
        rows.iter().map(|r| r[1]).sum::<f64>(),
    ];
    let total = column_totals[0] + column_totals[1];
    if column_totals.iter().any(|t| *t <= 0.0) {
        return None;
    }

    let df = (rows.len() - 1) as f64;
    let yates = rows.len() == 2;
    let mut statistic = 0.0;
    let mut sparse_expected = false;
    for row in &rows {
        let row_total = row[0] + row[1];
        for (observed, column_total) in row.iter().zip(column_totals) {
            let expected = row_total * column_total / total;
            if expected < SPARSE_EXPECTED_COUNT {
                sparse_expected = true;
            }
            let mut deviation = (observed - expected).abs();
            if yates {
                deviation = (deviation - 0.5).max(0.0);
            }
            statistic += deviation * deviation / expected;
        }
    }

    let result = finite_result(statistic, df, chi_square_survival(statistic, df))?;
    Some(AssociationTest {
        result,
        sparse_expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(values: &[f64]) -> Vec<(f64, f64)> {
        values.iter().map(|v| (*v, 1.0)).collect()
    }

    #[test]
    fn moments_with_unit_weights() {
        let m = WeightedMoments::from_pairs(&unit(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        assert!((m.mean - 2.5).abs() < 1e-12);
        assert!((m.variance.unwrap() - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn frequency_weights_equal_repeated_values() {
        let weighted = WeightedMoments::from_pairs(&[(1.0, 2.0), (4.0, 1.0)]).unwrap();
        let repeated = WeightedMoments::from_pairs(&unit(&[1.0, 1.0, 4.0])).unwrap();
        assert!((weighted.mean - repeated.mean).abs() < 1e-12);
        assert!((weighted.variance.unwrap() - repeated.variance.unwrap()).abs() < 1e-12);
    }

    #[test]
    fn paired_test_reference() {
        // Differences 1, 2, 3: mean 2, sd 1, t = 2 / (1 / sqrt 3) = 3.4641, df 2.
        let result = paired_t_test(&unit(&[1.0, 2.0, 3.0])).unwrap();
        assert!((result.statistic - 3.464_101_615).abs() < 1e-6);
        assert!((result.df - 2.0).abs() < 1e-12);
        assert!((result.p_value - 0.074_179_900).abs() < 1e-6);
    }

    #[test]
    fn constant_differences_are_degenerate() {
        assert!(paired_t_test(&unit(&[2.0, 2.0, 2.0])).is_none());
        assert!(paired_t_test(&unit(&[2.0])).is_none());
        assert!(paired_t_test(&[]).is_none());
    }

    #[test]
    fn welch_test_reference() {
        let left = unit(&[1.0, 2.0, 3.0]);
        let right = unit(&[4.0, 5.0, 6.0]);
        let result = welch_t_test(&left, &right).unwrap();
        // mean diff 3, se = sqrt(1/3 + 1/3) = 0.8165, t = 3.6742, df = 4
        assert!((result.statistic - 3.674_234_614).abs() < 1e-6);
        assert!((result.df - 4.0).abs() < 1e-9);
        assert!((result.p_value - 0.021_311_641).abs() < 1e-5);
    }

    #[test]
    fn chi_square_with_yates_correction() {
        // 2x2 table [[10, 20], [20, 10]]: Yates chi2 = 5.4, p = 0.0201
        let test = chi_square_association(&[[10.0, 20.0], [20.0, 10.0]]).unwrap();
        assert!((test.result.statistic - 5.4).abs() < 1e-9);
        assert!((test.result.df - 1.0).abs() < 1e-12);
        assert!((test.result.p_value - 0.020_136_752).abs() < 1e-6);
        assert!(!test.sparse_expected);
    }

    #[test]
    fn chi_square_drops_empty_rows_and_flags_sparse() {
        let test = chi_square_association(&[[3.0, 1.0], [0.0, 0.0], [1.0, 3.0], [2.0, 2.0]]).unwrap();
        assert!((test.result.df - 2.0).abs() < 1e-12);
        assert!(test.sparse_expected);
        assert!(chi_square_association(&[[3.0, 1.0], [0.0, 0.0]]).is_none());
        assert!(chi_square_association(&[[3.0, 0.0], [1.0, 0.0]]).is_none());
    }
}
