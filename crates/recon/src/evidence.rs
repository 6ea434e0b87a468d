//! Per-group evidence trail and conflict payloads produced by a pass.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::{Identifier, KirLigand, Resolution};

/// Children of one group that share a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEvidence {
    pub ligand: KirLigand,
    pub children: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupOutcome {
    /// Every labelled child agreed; a parent record was added.
    Derived { ligand: KirLigand },
    /// No child carried a label.
    NoEvidence,
    /// The parent was already an explicit record and was left as is.
    ExplicitParent,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupEvidence {
    pub parent: Identifier,
    pub resolution: Resolution,
    pub members: Vec<Identifier>,
    /// Distinct labels in the order they were first seen.
    pub labels: Vec<LabelEvidence>,
    /// Members without a classification.
    pub absent: Vec<Identifier>,
    pub outcome: GroupOutcome,
}

/// A parent whose children carry more than one distinct label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupConflict {
    pub parent: Identifier,
    pub resolution: Resolution,
    /// Labelled children grouped by label, labels in first-seen order.
    pub labels: Vec<LabelEvidence>,
}

impl GroupConflict {
    /// Flattened (child, label) pairs, grouped by label.
    pub fn pairs(&self) -> Vec<(&Identifier, KirLigand)> {
        self.labels
            .iter()
            .flat_map(|e| e.children.iter().map(move |c| (c, e.ligand)))
            .collect()
    }
}

impl fmt::Display for GroupConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.parent)?;
        for (child, ligand) in self.pairs() {
            writeln!(f, "  - {child}: {ligand}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_groups: usize,
    pub derived: usize,
    pub no_evidence: usize,
    pub explicit_parent: usize,
    pub derived_by_resolution: BTreeMap<String, usize>,
}

/// Collect distinct labels across `members`, keeping first-seen order.
pub fn collect_labels<'a, I>(members: I) -> Vec<LabelEvidence>
where
    I: IntoIterator<Item = (&'a Identifier, Option<KirLigand>)>,
{
    let mut labels: Vec<LabelEvidence> = Vec::new();
    for (child, ligand) in members {
        let Some(ligand) = ligand else {
            continue;
        };
        match labels.iter_mut().find(|e| e.ligand == ligand) {
            Some(existing) => existing.children.push(child.clone()),
            None => labels.push(LabelEvidence {
                ligand,
                children: vec![child.clone()],
            }),
        }
    }
    labels
}

/// Compute summary statistics from group evidence.
pub fn compute_summary(evidence: &[GroupEvidence]) -> ReconSummary {
    let mut summary = ReconSummary {
        total_groups: evidence.len(),
        ..ReconSummary::default()
    };

    for group in evidence {
        match group.outcome {
            GroupOutcome::Derived { .. } => {
                summary.derived += 1;
                *summary
                    .derived_by_resolution
                    .entry(group.resolution.to_string())
                    .or_insert(0) += 1;
            }
            GroupOutcome::NoEvidence => summary.no_evidence += 1,
            GroupOutcome::ExplicitParent => summary.explicit_parent += 1,
        }
    }

    summary
}
