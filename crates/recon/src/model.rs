use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// How many colon-separated fields of an allele name are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// First field only, e.g. `C*02`.
    AlleleGroup,
    /// First two fields, e.g. `C*17:01`.
    Protein,
    /// First three fields, e.g. `C*17:01:01`.
    Synonymous,
}

impl Resolution {
    pub fn field_count(self) -> usize {
        match self {
            Self::AlleleGroup => 1,
            Self::Protein => 2,
            Self::Synonymous => 3,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlleleGroup => write!(f, "allele_group"),
            Self::Protein => write!(f, "protein"),
            Self::Synonymous => write!(f, "synonymous"),
        }
    }
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// Expression status letters that may trail the last field (`A*01:01:01:02N`).
const EXPRESSION_SUFFIXES: &[char] = &['N', 'L', 'S', 'C', 'A', 'Q'];

const MAX_FIELDS: usize = 4;

/// A parsed HLA allele name: `LOCUS*F1[:F2[:F3[:F4]]][suffix]`.
///
/// Equality, ordering and hashing use the name exactly as it was given, so an
/// `Identifier` can be looked up by `&str` in hashed collections.
#[derive(Debug, Clone)]
pub struct Identifier {
    raw: String,
    locus: String,
    fields: Vec<String>,
    suffix: Option<char>,
}

impl Identifier {
    pub fn parse(input: &str) -> Result<Self, ReconError> {
        let malformed = |reason: &str| ReconError::MalformedIdentifier {
            identifier: input.to_string(),
            reason: reason.to_string(),
        };

        let (locus, rest) = input
            .split_once('*')
            .ok_or_else(|| malformed("missing '*' between locus and fields"))?;
        if locus.is_empty() || !locus.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed("locus must be non-empty and alphanumeric"));
        }

        let mut parts: Vec<&str> = rest.split(':').collect();
        if parts.len() > MAX_FIELDS {
            return Err(malformed("more than four fields"));
        }

        let mut suffix = None;
        if let Some(last) = parts.last_mut() {
            let field: &str = *last;
            if let Some(c) = field.chars().last().filter(|c| EXPRESSION_SUFFIXES.contains(c)) {
                suffix = Some(c);
                *last = &field[..field.len() - 1];
            }
        }

        let mut fields = Vec::with_capacity(parts.len());
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed("fields must be non-empty and numeric"));
            }
            fields.push(part.to_string());
        }

        Ok(Self {
            raw: input.to_string(),
            locus: locus.to_string(),
            fields,
            suffix,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn locus(&self) -> &str {
        &self.locus
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn suffix(&self) -> Option<char> {
        self.suffix
    }

    /// The parent form of this name at `resolution`.
    ///
    /// Returns `None` unless this name is strictly finer than `resolution`,
    /// so a name is never its own parent. The expression suffix is dropped.
    pub fn parent_at(&self, resolution: Resolution) -> Option<Identifier> {
        let keep = resolution.field_count();
        if self.fields.len() <= keep {
            return None;
        }
        let fields = self.fields[..keep].to_vec();
        Some(Self {
            raw: format!("{}*{}", self.locus, fields.join(":")),
            locus: self.locus.clone(),
            fields,
            suffix: None,
        })
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Identifier {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Identifier::parse(&raw).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// KIR ligand label as published per allele, including the Bw4 residue-80
/// detail when the source reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KirLigand {
    #[serde(rename = "Bw4")]
    Bw4,
    #[serde(rename = "Bw4 - 80T")]
    Bw4Thr80,
    #[serde(rename = "Bw4 - 80I")]
    Bw4Ile80,
    Bw6,
    C1,
    C2,
}

impl KirLigand {
    pub const ALL: [KirLigand; 6] = [
        Self::Bw4,
        Self::Bw4Thr80,
        Self::Bw4Ile80,
        Self::Bw6,
        Self::C1,
        Self::C2,
    ];

    /// Parse a label as the data source spells it. Surrounding whitespace is
    /// ignored.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|l| l.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bw4 => "Bw4",
            Self::Bw4Thr80 => "Bw4 - 80T",
            Self::Bw4Ile80 => "Bw4 - 80I",
            Self::Bw6 => "Bw6",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    pub fn ligand_type(self) -> LigandType {
        match self {
            Self::Bw4 | Self::Bw4Thr80 | Self::Bw4Ile80 => LigandType::Bw4,
            Self::Bw6 => LigandType::Bw6,
            Self::C1 => LigandType::C1,
            Self::C2 => LigandType::C2,
        }
    }
}

impl fmt::Display for KirLigand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base ligand category, with Bw4 sub-types folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LigandType {
    Bw4,
    Bw6,
    C1,
    C2,
}

impl LigandType {
    /// Inhibitory KIR receptors that bind this ligand.
    pub fn receptors(self) -> &'static [&'static str] {
        match self {
            Self::Bw4 => &["KIR3DL1"],
            Self::C1 => &["KIR2DL2", "KIR2DL3"],
            Self::C2 => &["KIR2DL1"],
            Self::Bw6 => &[],
        }
    }

    /// Bw6 is a serological epitope, not a KIR ligand.
    pub fn is_kir_ligand(self) -> bool {
        !self.receptors().is_empty()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bw4 => "Bw4",
            Self::Bw6 => "Bw6",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for LigandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Supplied by the data source or a cached snapshot.
    Observed,
    /// Synthesized from consistent child records.
    Derived,
}

/// One allele name with its label, or `None` when the source has no
/// classification for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub identifier: Identifier,
    pub ligand: Option<KirLigand>,
    pub origin: Origin,
}

impl Record {
    pub fn observed(identifier: Identifier, ligand: Option<KirLigand>) -> Self {
        Self {
            identifier,
            ligand,
            origin: Origin::Observed,
        }
    }

    pub fn derived(identifier: Identifier, ligand: KirLigand) -> Self {
        Self {
            identifier,
            ligand: Some(ligand),
            origin: Origin::Derived,
        }
    }
}

/// One allele as returned by the allele query API.
#[derive(Debug, Clone, Deserialize)]
pub struct AlleleEntry {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "matching.kir_ligand", default)]
    pub kir_ligand: Option<String>,
}

/// Insertion-ordered snapshot of records, indexed by allele name.
///
/// A snapshot is built once per retrieval (or cache load) and only read
/// afterwards; a refresh builds a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<Identifier, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (S, Option<KirLigand>)>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, ligand) in pairs {
            set.insert_observed(Identifier::parse(name.as_ref())?, ligand)?;
        }
        Ok(set)
    }

    /// Build from label strings. An empty label counts as no classification.
    pub fn from_labels<I, S, L>(pairs: I) -> Result<Self, ReconError>
    where
        I: IntoIterator<Item = (S, Option<L>)>,
        S: AsRef<str>,
        L: AsRef<str>,
    {
        let mut set = Self::new();
        for (name, label) in pairs {
            let identifier = Identifier::parse(name.as_ref())?;
            let ligand = parse_label(&identifier, label.as_ref().map(|l| l.as_ref()))?;
            set.insert_observed(identifier, ligand)?;
        }
        Ok(set)
    }

    /// Build from API entries. Entries without a name are skipped.
    pub fn from_entries(entries: &[AlleleEntry]) -> Result<Self, ReconError> {
        Self::from_labels(
            entries
                .iter()
                .filter(|e| !e.name.is_empty())
                .map(|e| (e.name.as_str(), e.kir_ligand.as_deref())),
        )
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identifier: &str) -> Option<&Record> {
        self.index.get(identifier).map(|&i| &self.records[i])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn derived(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.origin == Origin::Derived)
    }

    fn insert_observed(
        &mut self,
        identifier: Identifier,
        ligand: Option<KirLigand>,
    ) -> Result<(), ReconError> {
        if let Some(existing) = self.get(identifier.as_str()) {
            if existing.ligand == ligand {
                return Ok(());
            }
            return Err(ReconError::DuplicateIdentifier {
                identifier: identifier.to_string(),
                first: existing.ligand,
                second: ligand,
            });
        }
        self.push(Record::observed(identifier, ligand));
        Ok(())
    }

    /// Append a synthesized record. Existing names are left untouched.
    pub(crate) fn push_derived(&mut self, record: Record) -> bool {
        if self.contains(record.identifier.as_str()) {
            return false;
        }
        self.push(record);
        true
    }

    fn push(&mut self, record: Record) {
        self.index.insert(record.identifier.clone(), self.records.len());
        self.records.push(record);
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn parse_label(identifier: &Identifier, label: Option<&str>) -> Result<Option<KirLigand>, ReconError> {
    match label.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => KirLigand::parse(value)
            .map(Some)
            .ok_or_else(|| ReconError::UnknownLabel {
                identifier: identifier.to_string(),
                value: value.to_string(),
            }),
    }
}

/// Serialized as an ordered object of allele name to label (or null).
impl Serialize for RecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(record.identifier.as_str(), &record.ligand)?;
        }
        map.end()
    }
}

/// Every loaded record is treated as observed, including entries a previous
/// pass derived.
impl<'de> Deserialize<'de> for RecordSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordSetVisitor;

        impl<'de> Visitor<'de> for RecordSetVisitor {
            type Value = RecordSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of allele name to KIR ligand label or null")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RecordSet, A::Error> {
                let mut set = RecordSet::new();
                while let Some((name, label)) = access.next_entry::<String, Option<String>>()? {
                    let identifier = Identifier::parse(&name).map_err(de::Error::custom)?;
                    let ligand =
                        parse_label(&identifier, label.as_deref()).map_err(de::Error::custom)?;
                    set.insert_observed(identifier, ligand)
                        .map_err(de::Error::custom)?;
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(RecordSetVisitor)
    }
}
