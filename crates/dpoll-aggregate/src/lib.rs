//! Aggregation of matched units into comparison tables.
//!
//! - **plan**: which (ordinal, breakdown, weight) tables to compute
//! - **aggregate**: weighted cells, sub-cells and comparisons per table
//! - **nominal**: weighted category distributions of nominal variables
//! - **inference**: weighted t-tests and the chi-square association test
//! - **distribution**: Student-t and chi-square tail probabilities

pub mod aggregate;
pub mod distribution;
pub mod error;
pub mod inference;
pub mod nominal;
pub mod plan;

pub use aggregate::{aggregate, aggregate_all, aggregate_all_with_progress};
pub use error::{AggregateError, Result};
pub use inference::{SPARSE_EXPECTED_COUNT, chi_square_association, paired_t_test, welch_t_test};
pub use nominal::{
    aggregate_distribution, aggregate_distributions, aggregate_distributions_with_progress,
};
pub use plan::{plan_distributions, plan_tables, weight_label, weight_specs};
