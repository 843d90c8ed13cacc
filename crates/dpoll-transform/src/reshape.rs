//! Reshaper: aligns each respondent across time points.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use dpoll_model::{Code, Design, MatchedUnit, Metadata, RespondentRecord, VariableRole};

use crate::error::{IntegrityIssue, Result, TransformError};

/// Matched units in order of each identifier's first appearance, plus the
/// time and group design seen in the records.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaped {
    pub units: Vec<MatchedUnit>,
    pub design: Design,
}

impl Reshaped {
    /// Restartable iteration over the units.
    pub fn iter(&self) -> std::slice::Iter<'_, MatchedUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, identifier: Code) -> Option<&MatchedUnit> {
        self.units.iter().find(|u| u.identifier == identifier)
    }
}

impl<'a> IntoIterator for &'a Reshaped {
    type Item = &'a MatchedUnit;
    type IntoIter = std::slice::Iter<'a, MatchedUnit>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}

struct Pending<'a> {
    identifier: Code,
    groups: Vec<(Code, usize)>,
    waves: BTreeMap<Code, Vec<&'a RespondentRecord>>,
}

/// Groups records by identifier and partitions them by time.
///
/// Two records for one identifier at one time, or one identifier in two
/// groups, are integrity errors. Every such problem is collected before
/// failing; nothing is guessed.
pub fn reshape(records: &[RespondentRecord], metadata: &Metadata) -> Result<Reshaped> {
    let id_var = metadata.require_role(VariableRole::Identifier)?;
    let time_var = metadata.require_role(VariableRole::TimeMarker)?;
    let group_var = metadata.require_role(VariableRole::GroupMarker)?;

    let mut design = Design::default();
    let mut order: Vec<Pending<'_>> = Vec::new();
    let mut positions: HashMap<Code, usize> = HashMap::new();

    for record in records {
        design.observe(record.time, record.group);
        let position = *positions.entry(record.identifier).or_insert_with(|| {
            order.push(Pending {
                identifier: record.identifier,
                groups: Vec::new(),
                waves: BTreeMap::new(),
            });
            order.len() - 1
        });
        let pending = &mut order[position];
        pending.groups.push((record.group, record.row));
        pending.waves.entry(record.time).or_default().push(record);
    }

    let mut issues = Vec::new();
    let mut units = Vec::with_capacity(order.len());
    for pending in order {
        let identifier = id_var.label_for(pending.identifier);

        let distinct: BTreeSet<Code> = pending.groups.iter().map(|(g, _)| *g).collect();
        if distinct.len() > 1 {
            let mut seen = Vec::new();
            for (group, _) in &pending.groups {
                if !seen.contains(group) {
                    seen.push(*group);
                }
            }
            issues.push(IntegrityIssue::GroupConflict {
                identifier: identifier.clone(),
                groups: seen.iter().map(|g| group_var.label_for(*g)).collect(),
                rows: pending.groups.iter().map(|(_, row)| *row).collect(),
            });
        }

        let mut waves = BTreeMap::new();
        for (time, observed) in pending.waves {
            if observed.len() > 1 {
                issues.push(IntegrityIssue::DuplicateObservation {
                    identifier: identifier.clone(),
                    time: time_var.label_for(time),
                    rows: observed.iter().map(|r| r.row).collect(),
                });
                continue;
            }
            if let Some(record) = observed.first() {
                waves.insert(time, record.values.clone());
            }
        }

        if let Some(&(group, _)) = pending.groups.first() {
            units.push(MatchedUnit {
                identifier: pending.identifier,
                group,
                waves,
            });
        }
    }

    if !issues.is_empty() {
        tracing::warn!(issues = issues.len(), "integrity errors while reshaping");
        return Err(TransformError::Integrity(issues));
    }

    tracing::debug!(
        units = units.len(),
        times = design.times.len(),
        groups = design.groups.len(),
        "reshaped records into matched units"
    );
    Ok(Reshaped { units, design })
}
