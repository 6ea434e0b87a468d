//! Consensus classification over several molecular alleles, as needed for a
//! serological antigen that maps to many alleles.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::classify::lookup;
use crate::error::ReconError;
use crate::model::{KirLigand, LigandType, RecordSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailConsensus {
    Single(KirLigand),
    /// Same base type, several published details (e.g. 80T and 80I).
    Mixed(Vec<KirLigand>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusOutcome {
    Uniform {
        ligand_type: LigandType,
        detail: DetailConsensus,
    },
    /// Alleles disagree on the base type. Reported, never resolved.
    Mixed(Vec<LigandType>),
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consensus {
    pub outcome: ConsensusOutcome,
    /// Alleles with no record in the snapshot.
    pub unresolved: Vec<String>,
}

impl Consensus {
    /// Base type when every labelled allele agrees on it.
    pub fn ligand_type(&self) -> Option<LigandType> {
        match self.outcome {
            ConsensusOutcome::Uniform { ligand_type, .. } => Some(ligand_type),
            _ => None,
        }
    }

    pub fn is_kir_ligand(&self) -> bool {
        self.ligand_type().is_some_and(LigandType::is_kir_ligand)
    }

    pub fn receptors(&self) -> &'static [&'static str] {
        self.ligand_type().map(LigandType::receptors).unwrap_or(&[])
    }
}

/// Combine the labels of `alleles`.
///
/// Alleles without any record are listed in `unresolved`; alleles recorded
/// without a label contribute nothing.
pub fn consensus<S: AsRef<str>>(records: &RecordSet, alleles: &[S]) -> Result<Consensus, ReconError> {
    let mut details: BTreeSet<KirLigand> = BTreeSet::new();
    let mut unresolved = Vec::new();

    for allele in alleles {
        let allele = allele.as_ref();
        match lookup(records, allele) {
            Ok(Some(ligand)) => {
                details.insert(ligand);
            }
            Ok(None) => {}
            Err(ReconError::NotFound { identifier }) => unresolved.push(identifier),
            Err(e) => return Err(e),
        }
    }

    let types: Vec<LigandType> = details
        .iter()
        .map(|l| l.ligand_type())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut details: Vec<KirLigand> = details.into_iter().collect();

    let outcome = match types.as_slice() {
        [] => ConsensusOutcome::NoData,
        &[ligand_type] => {
            let detail = if details.len() == 1 {
                DetailConsensus::Single(details.remove(0))
            } else {
                DetailConsensus::Mixed(details)
            };
            ConsensusOutcome::Uniform { ligand_type, detail }
        }
        _ => ConsensusOutcome::Mixed(types),
    };

    Ok(Consensus { outcome, unresolved })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordSet {
        RecordSet::from_pairs([
            ("B*07:02", Some(KirLigand::Bw6)),
            ("B*07:05", Some(KirLigand::Bw6)),
            ("B*51:01", Some(KirLigand::Bw4Ile80)),
            ("B*51:02", Some(KirLigand::Bw4Thr80)),
            ("B*15:01", Some(KirLigand::Bw6)),
            ("B*15:13", Some(KirLigand::Bw4Ile80)),
            ("B*07:99", None),
        ])
        .unwrap()
    }

    #[test]
    fn uniform_single_detail() {
        let c = consensus(&sample(), &["B*07:02", "B*07:05", "B*07:99"]).unwrap();
        assert_eq!(
            c.outcome,
            ConsensusOutcome::Uniform {
                ligand_type: LigandType::Bw6,
                detail: DetailConsensus::Single(KirLigand::Bw6),
            }
        );
        assert!(!c.is_kir_ligand());
        assert!(c.unresolved.is_empty());
    }

    #[test]
    fn uniform_type_with_mixed_detail() {
        let c = consensus(&sample(), &["B*51:01", "B*51:02"]).unwrap();
        assert_eq!(
            c.outcome,
            ConsensusOutcome::Uniform {
                ligand_type: LigandType::Bw4,
                detail: DetailConsensus::Mixed(vec![KirLigand::Bw4Thr80, KirLigand::Bw4Ile80]),
            }
        );
        assert_eq!(c.receptors(), &["KIR3DL1"]);
    }

    #[test]
    fn mixed_types_are_reported() {
        let c = consensus(&sample(), &["B*15:01", "B*15:13"]).unwrap();
        assert_eq!(c.outcome, ConsensusOutcome::Mixed(vec![LigandType::Bw4, LigandType::Bw6]));
        assert_eq!(c.ligand_type(), None);
        assert!(!c.is_kir_ligand());
    }

    #[test]
    fn missing_alleles_are_unresolved() {
        let c = consensus(&sample(), &["B*08:01", "B*07:99"]).unwrap();
        assert_eq!(c.outcome, ConsensusOutcome::NoData);
        assert_eq!(c.unresolved, vec!["B*08:01".to_string()]);
    }

    #[test]
    fn unparseable_allele_is_unresolved() {
        let c = consensus(&sample(), &["B*07:02", "B*07:02:01:01:01", "B7"]).unwrap();
        assert_eq!(c.ligand_type(), Some(LigandType::Bw6));
        assert_eq!(c.unresolved, vec!["B*07:02:01:01:01".to_string(), "B7".to_string()]);
    }
}
