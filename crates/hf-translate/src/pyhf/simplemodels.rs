//! Simple model builders for quick experiments and tests.
//!
//! Each function returns a one-channel [`Workspace`] with a `mu`-scaled
//! signal on top of a background carrying one kind of uncertainty. Observed
//! data is set to signal + background.

use super::schema::{Channel, Measurement, MeasurementConfig, Modifier, Observation, Sample, Workspace};
use hf_core::{Error, Result};

const CHANNEL: &str = "singlechannel";

fn check_lengths(signal: &[f64], others: &[(&str, &[f64])]) -> Result<()> {
    if signal.is_empty() {
        return Err(Error::Validation("signal must not be empty".to_string()));
    }
    for (what, v) in others {
        if v.len() != signal.len() {
            return Err(Error::BinCountMismatch {
                channel: CHANNEL.to_string(),
                sample: what.to_string(),
                expected: signal.len(),
                got: v.len(),
            });
        }
    }
    Ok(())
}

fn single_channel(signal: &[f64], bkg: &[f64], bkg_modifier: Modifier) -> Workspace {
    Workspace {
        channels: vec![Channel {
            name: CHANNEL.to_string(),
            samples: vec![
                Sample {
                    name: "signal".to_string(),
                    data: signal.to_vec(),
                    modifiers: vec![Modifier::normfactor("mu")],
                },
                Sample { name: "background".to_string(), data: bkg.to_vec(), modifiers: vec![bkg_modifier] },
            ],
        }],
        observations: vec![Observation {
            name: CHANNEL.to_string(),
            data: bkg.iter().zip(signal).map(|(b, s)| b + s).collect(),
        }],
        measurements: vec![Measurement {
            name: "Measurement".to_string(),
            config: MeasurementConfig { poi: "mu".to_string(), parameters: vec![] },
        }],
        version: Some("1.0.0".to_string()),
    }
}

/// Background with **uncorrelated** per-bin absolute uncertainties (`shapesys`).
pub fn uncorrelated_background(signal: &[f64], bkg: &[f64], bkg_uncertainty: &[f64]) -> Result<Workspace> {
    check_lengths(signal, &[("background", bkg), ("bkg_uncertainty", bkg_uncertainty)])?;
    Ok(single_channel(signal, bkg, Modifier::shapesys("uncorr_bkguncrt", bkg_uncertainty)))
}

/// Background with a shape uncertainty **correlated** across bins (`histosys`).
pub fn correlated_background(
    signal: &[f64],
    bkg: &[f64],
    bkg_up: &[f64],
    bkg_down: &[f64],
) -> Result<Workspace> {
    check_lengths(signal, &[("background", bkg), ("bkg_up", bkg_up), ("bkg_down", bkg_down)])?;
    Ok(single_channel(signal, bkg, Modifier::histosys("corr_bkguncrt", bkg_down, bkg_up)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyhf::build_pyhf;

    #[test]
    fn test_uncorrelated_background() {
        let ws = uncorrelated_background(&[5.0, 10.0], &[50.0, 60.0], &[5.0, 12.0]).unwrap();
        assert_eq!(ws.channels.len(), 1);
        assert_eq!(ws.channels[0].samples.len(), 2);
        assert_eq!(ws.observations[0].data, vec![55.0, 70.0]);

        let model = build_pyhf(&ws).unwrap();
        assert_eq!(model.names(), vec!["mu", "uncorr_bkguncrt[0]", "uncorr_bkguncrt[1]"]);
        assert_eq!(model.poi_index(), Some(0));
        assert_eq!(model.expected().eval(&model.inits()).unwrap(), vec![55.0, 70.0]);
    }

    #[test]
    fn test_correlated_background() {
        let ws = correlated_background(&[5.0, 10.0], &[50.0, 60.0], &[55.0, 65.0], &[45.0, 55.0]).unwrap();
        let model = build_pyhf(&ws).unwrap();
        assert_eq!(model.names(), vec!["mu", "corr_bkguncrt"]);
        assert_eq!(model.expected().eval(&[1.0, 1.0]).unwrap(), vec![60.0, 75.0]);
        assert_eq!(model.expected().eval(&[0.0, -1.0]).unwrap(), vec![45.0, 55.0]);
    }

    #[test]
    fn test_length_checks() {
        assert!(matches!(uncorrelated_background(&[], &[], &[]), Err(Error::Validation(_))));
        assert!(matches!(
            correlated_background(&[1.0], &[1.0], &[1.0, 2.0], &[1.0]),
            Err(Error::BinCountMismatch { expected: 1, got: 2, .. })
        ));
    }
}
