use serde::Serialize;

use crate::aggregate::group_by_parent;
use crate::config::{ReconConfig, ReleaseVersion};
use crate::error::ReconError;
use crate::evidence::{compute_summary, GroupConflict, GroupEvidence, GroupOutcome, ReconSummary};
use crate::model::{Record, RecordSet, Resolution};

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release: Option<ReleaseVersion>,
    pub resolutions: Vec<Resolution>,
}

/// Output of a successful pass.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    /// Input records in their original order, followed by derived parents.
    pub records: RecordSet,
    pub derived_count: usize,
    pub evidence: Vec<GroupEvidence>,
}

impl Reconciliation {
    pub fn into_parts(self) -> (RecordSet, usize) {
        (self.records, self.derived_count)
    }
}

/// Reconcile with the default resolutions (protein, then allele group).
///
/// A complete release mixes labels within many allele groups (e.g. `B*15`),
/// so full snapshots usually need a protein-only [`ReconConfig`] and
/// [`reconcile_with`].
pub fn reconcile(records: &RecordSet) -> Result<Reconciliation, ReconError> {
    reconcile_with(&ReconConfig::default(), records)
}

/// Derive parent records wherever every labelled child agrees.
///
/// Groups are always built from `input` alone, so parents derived at one
/// resolution never feed a coarser one within the same pass. A parent that
/// is already an explicit record is never recomputed or checked. If any group
/// holds two distinct labels the whole pass fails and nothing is derived.
pub fn reconcile_with(config: &ReconConfig, input: &RecordSet) -> Result<Reconciliation, ReconError> {
    let mut evidence = Vec::new();
    let mut conflicts = Vec::new();
    let mut derived = Vec::new();

    for &resolution in &config.reconcile.resolutions {
        for group in group_by_parent(input, resolution) {
            let labels = group.labels();

            let outcome = if input.contains(group.parent.as_str()) {
                GroupOutcome::ExplicitParent
            } else {
                match labels.len() {
                    0 => GroupOutcome::NoEvidence,
                    1 => {
                        let ligand = labels[0].ligand;
                        derived.push(Record::derived(group.parent.clone(), ligand));
                        GroupOutcome::Derived { ligand }
                    }
                    _ => {
                        conflicts.push(GroupConflict {
                            parent: group.parent.clone(),
                            resolution,
                            labels,
                        });
                        continue;
                    }
                }
            };

            evidence.push(GroupEvidence {
                members: group.member_ids(),
                absent: group.absent_members(),
                parent: group.parent,
                resolution,
                labels,
                outcome,
            });
        }
    }

    if !conflicts.is_empty() {
        for conflict in &conflicts {
            log::warn!(
                "{} children disagree: {} distinct KIR ligand labels",
                conflict.parent,
                conflict.labels.len()
            );
        }
        return Err(ReconError::Conflict(conflicts));
    }

    let mut records = input.clone();
    let mut derived_count = 0;
    for record in derived {
        log::debug!(
            "derived {} = {}",
            record.identifier,
            record.ligand.map(|l| l.as_str()).unwrap_or("none")
        );
        if records.push_derived(record) {
            derived_count += 1;
        }
    }

    let summary = compute_summary(&evidence);
    log::info!(
        "reconciled {} records: {} groups, {} derived, {} without evidence, {} explicit",
        input.len(),
        summary.total_groups,
        summary.derived,
        summary.no_evidence,
        summary.explicit_parent
    );

    Ok(Reconciliation {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            release: config.release.clone(),
            resolutions: config.reconcile.resolutions.clone(),
        },
        summary,
        records,
        derived_count,
        evidence,
    })
}
