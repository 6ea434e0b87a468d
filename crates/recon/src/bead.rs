//! Single-antigen bead names such as `B27,Bw4` and validation of their
//! Bw4/Bw6 annotation against classification data.

use serde::Serialize;

use crate::classify::Classification;
use crate::consensus::Consensus;
use crate::error::ReconError;
use crate::model::LigandType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BeadAnnotation {
    Bw4,
    Bw6,
}

impl BeadAnnotation {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Bw4" => Some(Self::Bw4),
            "Bw6" => Some(Self::Bw6),
            _ => None,
        }
    }

    pub fn ligand_type(self) -> LigandType {
        match self {
            Self::Bw4 => LigandType::Bw4,
            Self::Bw6 => LigandType::Bw6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeadName {
    pub antigen: String,
    pub annotation: Option<BeadAnnotation>,
}

/// Split a bead name into antigen and annotation.
///
/// Only a single `antigen,annotation` pair with a Bw4/Bw6 annotation yields
/// an annotation; any other text after the comma is dropped. Names with more
/// than one comma are kept whole.
pub fn parse_bead_name(name: &str) -> BeadName {
    let parts: Vec<&str> = name.split(',').collect();
    match parts.as_slice() {
        [antigen, annotation] => BeadName {
            antigen: antigen.trim().to_string(),
            annotation: BeadAnnotation::parse(annotation),
        },
        _ => BeadName {
            antigen: name.trim().to_string(),
            annotation: None,
        },
    }
}

fn check(subject: &str, annotation: BeadAnnotation, observed: Option<LigandType>) -> Result<(), ReconError> {
    match observed {
        Some(observed) if observed != annotation.ligand_type() => Err(ReconError::BeadMismatch {
            subject: subject.to_string(),
            annotation: annotation.ligand_type(),
            observed,
        }),
        _ => Ok(()),
    }
}

/// Fail when an allele's base ligand type contradicts the bead annotation.
/// An unclassified allele never fails.
pub fn check_classification(
    annotation: BeadAnnotation,
    classification: &Classification,
) -> Result<(), ReconError> {
    check(
        &format!("allele {}", classification.identifier),
        annotation,
        classification.ligand_type,
    )
}

/// Fail when a uniform consensus contradicts the bead annotation. Mixed and
/// empty consensus never fail.
pub fn check_consensus(
    annotation: BeadAnnotation,
    antigen: &str,
    consensus: &Consensus,
) -> Result<(), ReconError> {
    check(&format!("serological antigen {antigen}"), annotation, consensus.ligand_type())
}
