use std::fmt;

use crate::evidence::GroupConflict;
use crate::model::{KirLigand, LigandType};

#[derive(Debug)]
pub enum ReconError {
    /// Allele name that does not parse as `LOCUS*F1[:F2...]`.
    MalformedIdentifier { identifier: String, reason: String },
    /// Label text outside the known KIR ligand vocabulary.
    UnknownLabel { identifier: String, value: String },
    /// The same allele name supplied twice with different labels.
    DuplicateIdentifier {
        identifier: String,
        first: Option<KirLigand>,
        second: Option<KirLigand>,
    },
    /// One or more parent groups whose children disagree. No records are
    /// derived by a pass that fails this way.
    Conflict(Vec<GroupConflict>),
    /// No record at all for the queried name.
    NotFound { identifier: String },
    /// Bead Bw4/Bw6 annotation contradicts the classification data.
    BeadMismatch {
        subject: String,
        annotation: LigandType,
        observed: LigandType,
    },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty resolution list, etc.).
    ConfigValidation(String),
}

impl ReconError {
    /// Conflicting groups, when this is a conflict.
    pub fn conflicts(&self) -> Option<&[GroupConflict]> {
        match self {
            Self::Conflict(conflicts) => Some(conflicts),
            _ => None,
        }
    }
}

fn label_or_none(ligand: &Option<KirLigand>) -> &'static str {
    ligand.map(KirLigand::as_str).unwrap_or("none")
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedIdentifier { identifier, reason } => {
                write!(f, "malformed allele name '{identifier}': {reason}")
            }
            Self::UnknownLabel { identifier, value } => {
                write!(f, "allele '{identifier}': unknown KIR ligand label '{value}'")
            }
            Self::DuplicateIdentifier { identifier, first, second } => write!(
                f,
                "allele '{identifier}' supplied twice with different labels ({} vs {})",
                label_or_none(first),
                label_or_none(second)
            ),
            Self::Conflict(conflicts) => {
                writeln!(f, "inconsistent KIR ligand types found for the following alleles:")?;
                for conflict in conflicts {
                    write!(f, "\n{conflict}")?;
                }
                Ok(())
            }
            Self::NotFound { identifier } => {
                write!(f, "no KIR ligand data available for '{identifier}'")
            }
            Self::BeadMismatch { subject, annotation, observed } => write!(
                f,
                "bead annotation '{annotation}' conflicts with classification data '{observed}' for {subject}"
            ),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
