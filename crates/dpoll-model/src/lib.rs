//! Core types for deliberative-poll survey analysis.
//!
//! Variables carry two independent classifications, a [`VariableRole`] and a
//! [`MeasurementLevel`]. The [`Metadata`] model is built once per run and
//! passed explicitly to every stage along with [`AnalysisOptions`].

pub mod code;
pub mod data;
pub mod error;
pub mod metadata;
pub mod options;
pub mod table;
pub mod variable;

pub use code::{Code, format_numeric};
pub use data::{Design, MatchedUnit, RespondentRecord, SurveyData};
pub use error::{ModelError, Result};
pub use metadata::Metadata;
pub use options::{AnalysisOptions, DOCUMENT_CELL_LIMIT};
pub use table::{
    AssociationTest, Cell, CellStats, Comparison, ComparisonKind, ComparisonStats,
    ComparisonTable, DistributionCell, DistributionComparison, DistributionRequest,
    DistributionTable, Statistic, TableRequest, TestResult, WeightSpec,
};
pub use variable::{MeasurementLevel, Variable, VariableRole, infer_role};
