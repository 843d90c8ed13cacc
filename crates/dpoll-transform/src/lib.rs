//! Record extraction and reshaping.
//!
//! - **records**: one [`RespondentRecord`](dpoll_model::RespondentRecord) per
//!   source row
//! - **reshape**: one [`MatchedUnit`](dpoll_model::MatchedUnit) per
//!   identifier, aligned across time points

pub mod error;
pub mod records;
pub mod reshape;

pub use error::{IntegrityIssue, Result, TransformError};
pub use records::extract_records;
pub use reshape::{Reshaped, reshape};
