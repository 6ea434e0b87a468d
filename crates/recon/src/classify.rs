use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{Identifier, KirLigand, LigandType, RecordSet};

/// Names of every classified record, keyed by label.
///
/// Within a label, names keep the order of `records`. Unclassified records
/// are left out.
pub fn group_by_label(records: &RecordSet) -> BTreeMap<KirLigand, Vec<Identifier>> {
    let mut grouped: BTreeMap<KirLigand, Vec<Identifier>> = BTreeMap::new();
    for record in records {
        if let Some(ligand) = record.ligand {
            grouped.entry(ligand).or_default().push(record.identifier.clone());
        }
    }
    grouped
}

/// Exact-match lookup.
///
/// `Ok(None)` means the record exists but carries no classification;
/// a name with no record at all is `NotFound`, whether or not it parses.
/// Shorter or alternate forms are not tried.
pub fn lookup(records: &RecordSet, identifier: &str) -> Result<Option<KirLigand>, ReconError> {
    records
        .get(identifier)
        .map(|r| r.ligand)
        .ok_or_else(|| ReconError::NotFound {
            identifier: identifier.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub identifier: String,
    /// Label as published, including Bw4 sub-type detail.
    pub ligand: Option<KirLigand>,
    pub ligand_type: Option<LigandType>,
    pub is_kir_ligand: bool,
    pub receptors: Vec<&'static str>,
}

impl Classification {
    pub(crate) fn from_ligand(identifier: &str, ligand: Option<KirLigand>) -> Self {
        let ligand_type = ligand.map(KirLigand::ligand_type);
        Self {
            identifier: identifier.to_string(),
            ligand,
            ligand_type,
            is_kir_ligand: ligand_type.is_some_and(LigandType::is_kir_ligand),
            receptors: ligand_type.map(|t| t.receptors().to_vec()).unwrap_or_default(),
        }
    }
}

/// Look up `identifier` and describe its KIR ligand properties.
pub fn classify(records: &RecordSet, identifier: &str) -> Result<Classification, ReconError> {
    let ligand = lookup(records, identifier)?;
    Ok(Classification::from_ligand(identifier, ligand))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordSet {
        RecordSet::from_pairs([
            ("B*07:02:01", Some(KirLigand::Bw6)),
            ("B*27:05:02", Some(KirLigand::Bw4Thr80)),
            ("C*01:02:01", Some(KirLigand::C1)),
            ("C*07:02:01:01", Some(KirLigand::C2)),
            ("A*01:01:01:01", None),
        ])
        .unwrap()
    }

    #[test]
    fn group_by_label_skips_absent() {
        let grouped = group_by_label(&sample());
        assert_eq!(grouped.len(), 4);
        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, 4);
        assert!(grouped
            .values()
            .flatten()
            .all(|id| id.as_str() != "A*01:01:01:01"));
    }

    #[test]
    fn lookup_exact_only() {
        let records = sample();
        assert_eq!(lookup(&records, "B*07:02:01").unwrap(), Some(KirLigand::Bw6));
        assert_eq!(lookup(&records, "A*01:01:01:01").unwrap(), None);

        // No fallback to a shorter stored form.
        let err = lookup(&records, "B*07:02:01:02").unwrap_err();
        assert!(matches!(err, ReconError::NotFound { .. }));
    }

    #[test]
    fn lookup_unparseable_query_is_not_found() {
        let records = RecordSet::from_pairs([("B*07:02", Some(KirLigand::Bw6))]).unwrap();
        for query in ["HLA-B*07:02", "not-hla", "B*07:02:01:01:01"] {
            let err = lookup(&records, query).unwrap_err();
            assert!(
                matches!(err, ReconError::NotFound { ref identifier } if identifier == query),
                "{query}: {err}"
            );
        }
    }

    #[test]
    fn classify_bw4_with_detail() {
        let c = classify(&sample(), "B*27:05:02").unwrap();
        assert_eq!(c.ligand, Some(KirLigand::Bw4Thr80));
        assert_eq!(c.ligand_type, Some(LigandType::Bw4));
        assert!(c.is_kir_ligand);
        assert_eq!(c.receptors, vec!["KIR3DL1"]);
    }

    #[test]
    fn classify_bw6_is_not_a_ligand() {
        let c = classify(&sample(), "B*07:02:01").unwrap();
        assert_eq!(c.ligand_type, Some(LigandType::Bw6));
        assert!(!c.is_kir_ligand);
        assert!(c.receptors.is_empty());
    }

    #[test]
    fn classify_c1() {
        let c = classify(&sample(), "C*01:02:01").unwrap();
        assert_eq!(c.receptors, vec!["KIR2DL2", "KIR2DL3"]);
    }

    #[test]
    fn classify_unlabelled_record() {
        let c = classify(&sample(), "A*01:01:01:01").unwrap();
        assert_eq!(c.ligand, None);
        assert_eq!(c.ligand_type, None);
        assert!(!c.is_kir_ligand);
    }

    #[test]
    fn classification_serializes_labels_as_text() {
        let c = classify(&sample(), "C*07:02:01:01").unwrap();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["ligand"], "C2");
        assert_eq!(json["ligand_type"], "C2");
        assert_eq!(json["receptors"][0], "KIR2DL1");
    }
}
