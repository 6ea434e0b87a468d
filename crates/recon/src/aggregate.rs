use std::collections::HashMap;

use crate::evidence::{collect_labels, LabelEvidence};
use crate::model::{Identifier, Record, RecordSet, Resolution};

/// Records that share one parent form at a single resolution.
#[derive(Debug, Clone)]
pub struct ParentGroup<'a> {
    pub parent: Identifier,
    pub resolution: Resolution,
    pub members: Vec<&'a Record>,
}

impl ParentGroup<'_> {
    pub fn member_ids(&self) -> Vec<Identifier> {
        self.members.iter().map(|r| r.identifier.clone()).collect()
    }

    /// Members that carry no classification.
    pub fn absent_members(&self) -> Vec<Identifier> {
        self.members
            .iter()
            .filter(|r| r.ligand.is_none())
            .map(|r| r.identifier.clone())
            .collect()
    }

    pub fn labels(&self) -> Vec<LabelEvidence> {
        collect_labels(self.members.iter().map(|r| (&r.identifier, r.ligand)))
    }
}

/// Group records by their parent form at `resolution`.
///
/// Groups come out in the order their first member appears in `records`, and
/// members keep record order. Records already at or coarser than `resolution`
/// belong to no group.
pub fn group_by_parent(records: &RecordSet, resolution: Resolution) -> Vec<ParentGroup<'_>> {
    let mut positions: HashMap<Identifier, usize> = HashMap::new();
    let mut groups: Vec<ParentGroup<'_>> = Vec::new();

    for record in records {
        let Some(parent) = record.identifier.parent_at(resolution) else {
            continue;
        };
        match positions.get(&parent).copied() {
            Some(i) => groups[i].members.push(record),
            None => {
                positions.insert(parent.clone(), groups.len());
                groups.push(ParentGroup {
                    parent,
                    resolution,
                    members: vec![record],
                });
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::KirLigand;

    fn names(group: &ParentGroup<'_>) -> Vec<String> {
        group.members.iter().map(|r| r.identifier.to_string()).collect()
    }

    #[test]
    fn groups_follow_first_appearance() {
        let records = RecordSet::from_pairs([
            ("C*07:02:01:01", Some(KirLigand::C1)),
            ("C*01:02:01", Some(KirLigand::C1)),
            ("C*07:01:01", Some(KirLigand::C1)),
            ("C*01:03", None),
        ])
        .unwrap();

        let groups = group_by_parent(&records, Resolution::AlleleGroup);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].parent.as_str(), "C*07");
        assert_eq!(names(&groups[0]), ["C*07:02:01:01", "C*07:01:01"]);
        assert_eq!(groups[1].parent.as_str(), "C*01");
        assert_eq!(names(&groups[1]), ["C*01:02:01", "C*01:03"]);
        assert_eq!(groups[1].absent_members()[0].as_str(), "C*01:03");
    }

    #[test]
    fn coarse_records_are_not_members() {
        let records = RecordSet::from_pairs([
            ("C*17:01", Some(KirLigand::C2)),
            ("C*17:01:01:01", None),
            ("C*17:01:02", Some(KirLigand::C2)),
            ("C*17", Some(KirLigand::C2)),
        ])
        .unwrap();

        let protein = group_by_parent(&records, Resolution::Protein);
        assert_eq!(protein.len(), 1);
        assert_eq!(protein[0].parent.as_str(), "C*17:01");
        assert_eq!(names(&protein[0]), ["C*17:01:01:01", "C*17:01:02"]);

        let group = group_by_parent(&records, Resolution::AlleleGroup);
        assert_eq!(group.len(), 1);
        assert_eq!(names(&group[0]), ["C*17:01", "C*17:01:01:01", "C*17:01:02"]);
    }

    #[test]
    fn loci_never_share_a_group() {
        let records = RecordSet::from_pairs([
            ("A*24:02", Some(KirLigand::Bw4)),
            ("B*24:02", Some(KirLigand::Bw6)),
        ])
        .unwrap();
        let groups = group_by_parent(&records, Resolution::AlleleGroup);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].labels().len(), 1);
    }
}
