//! Issue categories.

use serde::{Deserialize, Serialize};

/// Area of the dataset an issue concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Structure,
    Roles,
    Labels,
    Design,
    Weights,
    Configuration,
}

impl Category {
    pub const fn all() -> &'static [Self] {
        &[
            Self::Structure,
            Self::Roles,
            Self::Labels,
            Self::Design,
            Self::Weights,
            Self::Configuration,
        ]
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Structure => "Structure",
            Self::Roles => "Roles",
            Self::Labels => "Labels",
            Self::Design => "Design",
            Self::Weights => "Weights",
            Self::Configuration => "Configuration",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Structure => "Variable names and dataset columns",
            Self::Roles => "Identifier, time, group and analysis roles",
            Self::Labels => "Variable labels and value labels",
            Self::Design => "Group and time design of the survey",
            Self::Weights => "Weight variable values",
            Self::Configuration => "Analysis options declared in the codebook",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
