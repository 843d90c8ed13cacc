//! Survey data ingestion.
//!
//! Loads a CSV dataset and its TOML codebook into a [`SurveyData`] whose
//! columns are all `Float64`, together with the [`AnalysisOptions`] declared
//! in the codebook.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use dpoll_ingest::{CodebookCsvReader, DatasetReader};
//!
//! // Reads poll.csv and poll.codebook.toml
//! let loaded = CodebookCsvReader::new().read(Path::new("data/poll.csv"))?;
//! ```
//!
//! [`SurveyData`]: dpoll_model::SurveyData
//! [`AnalysisOptions`]: dpoll_model::AnalysisOptions

mod codebook;
mod csv;
mod error;
mod normalize;
mod reader;

// === Error Types ===
pub use error::{IngestError, Result};

// === Codebook ===
pub use codebook::{
    CODEBOOK_SCHEMA, CODEBOOK_SCHEMA_VERSION, Codebook, codebook_path_for, load_codebook,
    parse_codebook,
};

// === CSV Reading ===
pub use csv::read_csv_frame;
pub use normalize::normalize_columns;

// === Readers ===
pub use reader::{CodebookCsvReader, DatasetReader, LoadedSurvey};
