//! pyhf JSON schema types
//!
//! Modifiers are kept loosely typed (`type` string plus raw `data` value) so
//! that an unrecognized kind surfaces as
//! [`Error::UnsupportedModifierKind`](hf_core::Error::UnsupportedModifierKind)
//! from the builder rather than as an opaque parse failure.

use hf_core::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// pyhf workspace representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    /// Channels
    pub channels: Vec<Channel>,
    /// Observations
    #[serde(default)]
    pub observations: Vec<Observation>,
    /// Measurements
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    /// Schema version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Channel (region)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name
    pub name: String,
    /// Samples in this channel
    pub samples: Vec<Sample>,
}

/// Sample (process)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Sample name
    pub name: String,
    /// Expected event counts per bin
    pub data: Vec<f64>,
    /// Modifiers (systematics)
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

/// Modifier as declared in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    /// Modifier name; equal names denote one shared parameter.
    pub name: String,
    /// Raw `type` string (`normfactor`, `normsys`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Modifier {
    fn new(name: &str, kind: &str, data: serde_json::Value) -> Self {
        Self { name: name.to_string(), kind: kind.to_string(), data }
    }

    /// `normfactor` declaration.
    pub fn normfactor(name: &str) -> Self {
        Self::new(name, "normfactor", serde_json::Value::Null)
    }

    /// `shapefactor` declaration.
    pub fn shapefactor(name: &str) -> Self {
        Self::new(name, "shapefactor", serde_json::Value::Null)
    }

    /// `lumi` declaration.
    pub fn lumi(name: &str) -> Self {
        Self::new(name, "lumi", serde_json::Value::Null)
    }

    /// `normsys` declaration with down/up factors.
    pub fn normsys(name: &str, lo: f64, hi: f64) -> Self {
        Self::new(name, "normsys", serde_json::json!({ "hi": hi, "lo": lo }))
    }

    /// `histosys` declaration with down/up templates.
    pub fn histosys(name: &str, lo_data: &[f64], hi_data: &[f64]) -> Self {
        Self::new(name, "histosys", serde_json::json!({ "hi_data": hi_data, "lo_data": lo_data }))
    }

    /// `shapesys` declaration with absolute per-bin uncertainties.
    pub fn shapesys(name: &str, delta: &[f64]) -> Self {
        Self::new(name, "shapesys", serde_json::json!(delta))
    }

    /// `staterror` declaration with absolute per-bin uncertainties.
    pub fn staterror(name: &str, delta: &[f64]) -> Self {
        Self::new(name, "staterror", serde_json::json!(delta))
    }
}

/// normsys data (hi/lo factors)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormSysData {
    /// High (up) multiplicative factor.
    pub hi: f64,
    /// Low (down) multiplicative factor.
    pub lo: f64,
}

/// histosys data (up/down histograms)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoSysData {
    /// High (up) template values.
    pub hi_data: Vec<f64>,
    /// Low (down) template values.
    pub lo_data: Vec<f64>,
}

/// Observation (data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Channel name this observation belongs to
    pub name: String,
    /// Observed event counts per bin
    pub data: Vec<f64>,
}

/// Measurement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Measurement name
    pub name: String,
    /// Configuration
    pub config: MeasurementConfig,
}

/// Measurement config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Parameter of interest
    #[serde(default)]
    pub poi: String,
    /// Parameter configurations
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

impl MeasurementConfig {
    /// Configuration entry for `name`, if any.
    pub fn parameter(&self, name: &str) -> Option<&ParameterConfig> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Parameter configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterConfig {
    /// Parameter name
    pub name: String,
    /// Initial values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inits: Vec<f64>,
    /// Bounds [[min, max]]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<[f64; 2]>,
    /// Whether this parameter is fixed (frozen) in fits.
    #[serde(default)]
    pub fixed: bool,
    /// Auxiliary data (constraint centers)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxdata: Vec<f64>,
    /// Constraint widths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sigmas: Vec<f64>,
}

/// Pick the element for slot `elem_idx` from a per-parameter list.
///
/// A single entry applies to every slot of a per-bin modifier.
pub(crate) fn element<T: Copy>(values: &[T], elem_idx: usize) -> Option<T> {
    if values.len() == 1 { values.first().copied() } else { values.get(elem_idx).copied() }
}

impl Workspace {
    /// Parse a workspace from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert an already-parsed JSON mapping.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Measurement by name, or the first one when `name` is `None`.
    pub fn measurement(&self, name: Option<&str>) -> Option<&Measurement> {
        match name {
            Some(n) => self.measurements.iter().find(|m| m.name == n),
            None => self.measurements.first(),
        }
    }
}

/// Read and parse a pyhf JSON workspace from disk.
pub fn load_pyhfjson(path: impl AsRef<Path>) -> Result<Workspace> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "reading pyhf workspace");
    let text = std::fs::read_to_string(path)?;
    Workspace::from_json_str(&text)
}
