//! Assembly options

use super::interp::{AdditiveCode, MultiplicativeCode};
use hf_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs for [`build_pyhf_with`](super::build_pyhf_with).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Interpolation for normsys factors.
    pub normsys_interp: MultiplicativeCode,
    /// Interpolation for histosys templates.
    pub histosys_interp: AdditiveCode,
    /// Support of the flat prior given to unconstrained parameters.
    pub flat_range: [f64; 2],
    /// Measurement whose parameter configuration applies; `None` takes the first.
    pub measurement: Option<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            normsys_interp: MultiplicativeCode::Code4,
            histosys_interp: AdditiveCode::Code4p,
            flat_range: [0.0, 10.0],
            measurement: None,
        }
    }
}

impl BuildOptions {
    /// Load options from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let opts: Self = serde_json::from_str(&text)?;
        opts.validate()?;
        Ok(opts)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let [a, b] = self.flat_range;
        if !a.is_finite() || !b.is_finite() || a > b {
            return Err(Error::Validation(format!("flat_range must be finite with a <= b, got [{}, {}]", a, b)));
        }
        Ok(())
    }
}
