//! Library side of the `dpoll` binary.
//!
//! [`pipeline::outputs`] runs a dataset from CSV to written tables;
//! [`pipeline::check`] stops after validation.

pub mod logging;
pub mod pipeline;
pub mod types;
