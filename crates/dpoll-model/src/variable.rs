//! Variable declarations: role, measurement level and value labels.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::code::Code;

/// Measurement level tag carried by each column of the source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementLevel {
    Nominal,
    Ordinal,
    Scale,
}

impl MeasurementLevel {
    /// Parse the three-category tag, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nominal" => Some(Self::Nominal),
            "ordinal" => Some(Self::Ordinal),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::Ordinal => "ordinal",
            Self::Scale => "scale",
        }
    }
}

impl fmt::Display for MeasurementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part a variable plays in the analysis design.
///
/// Role and measurement level are independent fields; the validator links
/// them (design roles must be Scale, Ordinal role must be Ordinal level, and
/// so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    Identifier,
    TimeMarker,
    GroupMarker,
    Ordinal,
    Nominal,
    Weight,
}

impl VariableRole {
    /// Roles that exactly one variable must fill.
    pub const DESIGN: [VariableRole; 3] = [
        VariableRole::Identifier,
        VariableRole::TimeMarker,
        VariableRole::GroupMarker,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "identifier" | "id" => Some(Self::Identifier),
            "timemarker" | "time" => Some(Self::TimeMarker),
            "groupmarker" | "group" => Some(Self::GroupMarker),
            "ordinal" => Some(Self::Ordinal),
            "nominal" => Some(Self::Nominal),
            "weight" => Some(Self::Weight),
            _ => None,
        }
    }

    /// True for the roles that must be unique across the dataset.
    pub fn is_design(&self) -> bool {
        Self::DESIGN.contains(self)
    }

    /// Roles that require value labels on every observed code.
    pub fn is_labeled(&self) -> bool {
        matches!(self, Self::Ordinal | Self::Nominal)
    }

    /// Measurement level this role requires.
    pub fn required_level(&self) -> MeasurementLevel {
        match self {
            Self::Identifier | Self::TimeMarker | Self::GroupMarker | Self::Weight => {
                MeasurementLevel::Scale
            }
            Self::Ordinal => MeasurementLevel::Ordinal,
            Self::Nominal => MeasurementLevel::Nominal,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::TimeMarker => "TimeMarker",
            Self::GroupMarker => "GroupMarker",
            Self::Ordinal => "Ordinal",
            Self::Nominal => "Nominal",
            Self::Weight => "Weight",
        }
    }
}

impl fmt::Display for VariableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One column of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub label: String,
    /// `None` for auxiliary columns that take no part in the analysis.
    pub role: Option<VariableRole>,
    pub level: MeasurementLevel,
    pub value_labels: BTreeMap<Code, String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, level: MeasurementLevel) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            role: None,
            level,
            value_labels: BTreeMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_role(mut self, role: VariableRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_value_label(mut self, code: impl Into<Code>, label: impl Into<String>) -> Self {
        self.value_labels.insert(code.into(), label.into());
        self
    }

    pub fn has_role(&self, role: VariableRole) -> bool {
        self.role == Some(role)
    }

    /// The label, or the name when no label was declared.
    pub fn display_label(&self) -> &str {
        let trimmed = self.label.trim();
        if trimmed.is_empty() { &self.name } else { trimmed }
    }

    /// Text for a code: its value label when declared, otherwise the number.
    pub fn label_for(&self, code: Code) -> String {
        self.value_labels
            .get(&code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

/// Infers a role from naming conventions when the codebook declares none.
///
/// Scale variables named `IDs`/`ID`/`id`, `Time` and `Group` are the design
/// variables; a Scale variable whose name contains "weight" is a weight.
pub fn infer_role(name: &str, level: MeasurementLevel) -> Option<VariableRole> {
    match level {
        MeasurementLevel::Ordinal => Some(VariableRole::Ordinal),
        MeasurementLevel::Nominal => Some(VariableRole::Nominal),
        MeasurementLevel::Scale => match name {
            "IDs" | "ID" | "id" => Some(VariableRole::Identifier),
            "Time" => Some(VariableRole::TimeMarker),
            "Group" => Some(VariableRole::GroupMarker),
            _ if name.to_lowercase().contains("weight") => Some(VariableRole::Weight),
            _ => None,
        },
    }
}
