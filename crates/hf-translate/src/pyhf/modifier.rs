//! Modifier variants
//!
//! A [`ModifierRef`] is the typed form of one workspace modifier: its name,
//! its [`ModifierKind`] and the kind-specific payload. Kind-level behaviour
//! (slot granularity, neutral value, additive vs multiplicative) lives on
//! [`ModifierKind`] so the assembler can dispatch on a closed enum.

use super::schema::{HistoSysData, Modifier, NormSysData};
use hf_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The seven recognized modifier kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKind {
    /// Free-floating normalization (identity interpolation).
    Normfactor,
    /// Normalization systematic interpolated between `lo` and `hi` factors.
    Normsys,
    /// Shape systematic interpolated between `lo_data` and `hi_data` templates.
    Histosys,
    /// Per-bin constrained factors from absolute uncertainties.
    Shapesys,
    /// Per-bin free factors.
    Shapefactor,
    /// Per-bin MC statistical uncertainty factors.
    Staterror,
    /// Luminosity factor; width comes from the measurement section.
    Lumi,
}

impl ModifierKind {
    /// Every kind, in declaration order.
    pub const ALL: [ModifierKind; 7] = [
        Self::Normfactor,
        Self::Normsys,
        Self::Histosys,
        Self::Shapesys,
        Self::Shapefactor,
        Self::Staterror,
        Self::Lumi,
    ];

    /// Resolve a workspace `type` string.
    pub fn parse(kind: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == kind)
            .ok_or_else(|| Error::UnsupportedModifierKind { kind: kind.to_string() })
    }

    /// Workspace spelling of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normfactor => "normfactor",
            Self::Normsys => "normsys",
            Self::Histosys => "histosys",
            Self::Shapesys => "shapesys",
            Self::Shapefactor => "shapefactor",
            Self::Staterror => "staterror",
            Self::Lumi => "lumi",
        }
    }

    /// One parameter slot per bin (as opposed to a single shared slot).
    pub fn is_per_bin(self) -> bool {
        matches!(self, Self::Shapesys | Self::Shapefactor | Self::Staterror)
    }

    /// Contributes an additive shift rather than a factor.
    pub fn is_additive(self) -> bool {
        matches!(self, Self::Histosys)
    }

    /// Parameter value at which the modifier leaves the yield unchanged.
    pub fn neutral_value(self) -> f64 {
        match self {
            Self::Normsys | Self::Histosys => 0.0,
            _ => 1.0,
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a built modifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierData {
    /// No payload.
    Normfactor,
    /// No payload; one slot per bin.
    Shapefactor,
    /// Down/up multiplicative factors.
    Normsys {
        /// Factor at `α = -1`.
        lo: f64,
        /// Factor at `α = +1`.
        hi: f64,
    },
    /// Down/up templates (absolute yields, same length as the nominal).
    Histosys {
        /// Template at `α = -1`.
        lo_data: Vec<f64>,
        /// Template at `α = +1`.
        hi_data: Vec<f64>,
    },
    /// Absolute per-bin uncertainties.
    Shapesys {
        /// `δ` per bin.
        delta: Vec<f64>,
    },
    /// Absolute per-bin MC statistical uncertainties.
    Staterror {
        /// `δ` per bin.
        delta: Vec<f64>,
    },
    /// Luminosity; `sigma` is filled from the measurement section when present.
    Lumi {
        /// Relative luminosity uncertainty.
        sigma: Option<f64>,
    },
}

/// One built modifier of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierRef {
    /// Parameter name shared by every registration of this modifier.
    pub name: String,
    /// Kind tag.
    pub kind: ModifierKind,
    /// Payload.
    pub data: ModifierData,
}

impl ModifierRef {
    /// Length of the per-bin payload, if the kind carries one.
    pub fn payload_len(&self) -> Option<usize> {
        match &self.data {
            ModifierData::Histosys { lo_data, hi_data } => Some(lo_data.len().max(hi_data.len())),
            ModifierData::Shapesys { delta } | ModifierData::Staterror { delta } => Some(delta.len()),
            _ => None,
        }
    }

    /// Check per-bin payloads against the sample's bin count.
    pub fn validate_bins(&self, channel: &str, sample: &str, n_bins: usize) -> Result<()> {
        let mismatch = |got: usize| Error::BinCountMismatch {
            channel: channel.to_string(),
            sample: format!("{} / {} '{}'", sample, self.kind, self.name),
            expected: n_bins,
            got,
        };
        match &self.data {
            ModifierData::Histosys { lo_data, hi_data } => {
                for len in [lo_data.len(), hi_data.len()] {
                    if len != n_bins {
                        return Err(mismatch(len));
                    }
                }
            }
            ModifierData::Shapesys { delta } | ModifierData::Staterror { delta } => {
                if delta.len() != n_bins {
                    return Err(mismatch(delta.len()));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn payload<T: serde::de::DeserializeOwned>(raw: &Modifier, kind: ModifierKind) -> Result<T> {
    serde_json::from_value(raw.data.clone()).map_err(|e| {
        Error::Validation(format!("{} modifier '{}' has malformed data: {}", kind, raw.name, e))
    })
}

/// Build a typed modifier from its raw declaration, reading the payload for `kind`.
pub fn build_modifier(raw: &Modifier, kind: ModifierKind) -> Result<ModifierRef> {
    let data = match kind {
        ModifierKind::Normfactor => ModifierData::Normfactor,
        ModifierKind::Shapefactor => ModifierData::Shapefactor,
        ModifierKind::Lumi => ModifierData::Lumi { sigma: None },
        ModifierKind::Normsys => {
            let NormSysData { hi, lo } = payload(raw, kind)?;
            ModifierData::Normsys { lo, hi }
        }
        ModifierKind::Histosys => {
            let HistoSysData { hi_data, lo_data } = payload(raw, kind)?;
            ModifierData::Histosys { lo_data, hi_data }
        }
        ModifierKind::Shapesys => ModifierData::Shapesys { delta: payload(raw, kind)? },
        ModifierKind::Staterror => ModifierData::Staterror { delta: payload(raw, kind)? },
    };
    Ok(ModifierRef { name: raw.name.clone(), kind, data })
}

/// Resolve the kind from the raw `type` field, then build.
pub fn build_modifier_auto(raw: &Modifier) -> Result<ModifierRef> {
    build_modifier(raw, ModifierKind::parse(&raw.kind)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_every_kind() {
        for kind in ModifierKind::ALL {
            assert_eq!(ModifierKind::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let raw = Modifier { name: "x".into(), kind: "shapesyst".into(), data: serde_json::Value::Null };
        match build_modifier_auto(&raw) {
            Err(Error::UnsupportedModifierKind { kind }) => assert_eq!(kind, "shapesyst"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_normsys_payload() {
        let m = build_modifier_auto(&Modifier::normsys("syst", 0.9, 1.1)).unwrap();
        assert_eq!(m.kind, ModifierKind::Normsys);
        assert_eq!(m.data, ModifierData::Normsys { lo: 0.9, hi: 1.1 });
        assert_eq!(m.payload_len(), None);
    }

    #[test]
    fn test_histosys_payload_and_bin_validation() {
        let m = build_modifier_auto(&Modifier::histosys("shape", &[1.0, 2.0], &[3.0, 4.0])).unwrap();
        assert_eq!(m.payload_len(), Some(2));
        assert!(m.validate_bins("ch", "bkg", 2).is_ok());
        assert!(matches!(
            m.validate_bins("ch", "bkg", 3),
            Err(Error::BinCountMismatch { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_payload_is_a_validation_error() {
        let raw = Modifier {
            name: "syst".into(),
            kind: "normsys".into(),
            data: serde_json::json!({ "hi": 1.1 }),
        };
        let err = build_modifier_auto(&raw).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{:?}", err);
        assert!(err.to_string().contains("syst"));
    }

    #[test]
    fn test_kind_properties() {
        assert!(ModifierKind::Staterror.is_per_bin());
        assert!(!ModifierKind::Lumi.is_per_bin());
        assert!(ModifierKind::Histosys.is_additive());
        assert_eq!(ModifierKind::Normsys.neutral_value(), 0.0);
        assert_eq!(ModifierKind::Shapefactor.neutral_value(), 1.0);
        assert_eq!(ModifierKind::Lumi.to_string(), "lumi");
    }
}
