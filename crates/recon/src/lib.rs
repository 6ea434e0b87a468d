//! `kirmap-recon` — KIR ligand reconciliation engine for HLA alleles.
//!
//! Pure engine crate: receives an immutable snapshot of allele records,
//! derives lower-resolution parent records where the children agree, and
//! answers classification queries. No network, cache or CLI dependencies.

pub mod aggregate;
pub mod bead;
pub mod classify;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;

pub use classify::{classify, group_by_label, lookup, Classification};
pub use config::ReconConfig;
pub use consensus::{consensus, Consensus};
pub use engine::{reconcile, reconcile_with, Reconciliation};
pub use error::ReconError;
pub use evidence::GroupConflict;
pub use model::{AlleleEntry, Identifier, KirLigand, LigandType, Record, RecordSet, Resolution};
