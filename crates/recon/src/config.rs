use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ReconError;
use crate::model::Resolution;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    /// IPD-IMGT/HLA release the records came from. Diagnostics only.
    #[serde(default)]
    pub release: Option<ReleaseVersion>,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Parent resolutions to derive, processed in this order.
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<Resolution>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            resolutions: default_resolutions(),
        }
    }
}

fn default_resolutions() -> Vec<Resolution> {
    vec![Resolution::Protein, Resolution::AlleleGroup]
}

// ---------------------------------------------------------------------------
// Release version
// ---------------------------------------------------------------------------

/// Release version in dotted `X.YY.Z` form.
///
/// Accepts the compact form used in file names (`3610`), a two-part form
/// (`3.61`) or the dotted form as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    pub fn normalize(input: &str) -> Self {
        let input = input.trim();

        if input.matches('.').count() == 2 {
            return Self(input.to_string());
        }

        if input.len() == 4 && input.bytes().all(|b| b.is_ascii_digit()) {
            let major = &input[..1];
            let minor = input[1..3].trim_start_matches('0');
            let minor = if minor.is_empty() { "0" } else { minor };
            return Self(format!("{major}.{minor}.0"));
        }

        let stripped = input.strip_suffix(".0").unwrap_or(input);
        let parts: Vec<&str> = stripped.split('.').collect();
        match parts.as_slice() {
            [major, minor] => Self(format!("{major}.{minor}.0")),
            [major] if !major.is_empty() && major.len() <= 2 => Self(format!("{major}.0.0")),
            _ => Self(stripped.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRelease {
    Number(u64),
    Text(String),
}

impl<'de> Deserialize<'de> for ReleaseVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawRelease::deserialize(deserializer)? {
            RawRelease::Number(n) => Self::normalize(&n.to_string()),
            RawRelease::Text(s) => Self::normalize(&s),
        })
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if let Some(ref release) = self.release {
            if release.as_str().is_empty() {
                return Err(ReconError::ConfigValidation("release must not be empty".into()));
            }
        }

        let resolutions = &self.reconcile.resolutions;
        if resolutions.is_empty() {
            return Err(ReconError::ConfigValidation(
                "reconcile.resolutions must list at least one resolution".into(),
            ));
        }

        for (i, resolution) in resolutions.iter().enumerate() {
            if resolutions[..i].contains(resolution) {
                return Err(ReconError::ConfigValidation(format!(
                    "reconcile.resolutions lists '{resolution}' more than once"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
