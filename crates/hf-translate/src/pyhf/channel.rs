//! Sample and channel builders

use super::modifier::ModifierRef;
use super::registry::ModifierRegistry;
use super::schema::{Channel, Sample};
use hf_core::{Error, Result};
use std::collections::HashSet;

/// Expected counts of one sample: nominal yields plus ordered modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpCounts {
    /// Nominal yield per bin.
    pub nominal: Vec<f64>,
    /// Modifiers in declaration order.
    pub modifiers: Vec<ModifierRef>,
}

/// One built channel: samples keyed by name, in declaration order.
#[derive(Debug, Clone)]
pub struct BuiltChannel {
    /// Channel name.
    pub name: String,
    /// Global index of the channel's first bin.
    pub offset: usize,
    /// Bin count shared by every sample.
    pub n_bins: usize,
    /// `(sample name, counts)` pairs.
    pub samples: Vec<(String, ExpCounts)>,
}

impl BuiltChannel {
    /// Counts of sample `name`.
    pub fn sample(&self, name: &str) -> Option<&ExpCounts> {
        self.samples.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Sum of nominal yields over all samples.
    pub fn nominal_total(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_bins];
        for (_, counts) in &self.samples {
            for (t, v) in total.iter_mut().zip(&counts.nominal) {
                *t += v;
            }
        }
        total
    }
}

/// Build one sample, registering its modifiers against the shared registry.
pub fn build_sample(
    raw: &Sample,
    registry: &mut ModifierRegistry<'_>,
    channel: &str,
    bin_offset: usize,
) -> Result<ExpCounts> {
    let modifiers = raw
        .modifiers
        .iter()
        .map(|m| registry.register(m, &raw.data, bin_offset, channel, &raw.name))
        .collect::<Result<Vec<_>>>()?;
    Ok(ExpCounts { nominal: raw.data.clone(), modifiers })
}

/// Build every sample of a channel whose first bin sits at global index `bin_offset`.
///
/// The first sample establishes the channel's bin count.
pub fn build_channel(
    raw: &Channel,
    registry: &mut ModifierRegistry<'_>,
    bin_offset: usize,
) -> Result<BuiltChannel> {
    let n_bins = match raw.samples.first() {
        Some(s) if !s.data.is_empty() => s.data.len(),
        Some(_) => {
            return Err(Error::Validation(format!("Channel '{}' has no bins (empty sample data)", raw.name)));
        }
        None => return Err(Error::Validation(format!("Channel '{}' has no samples", raw.name))),
    };

    let mut seen = HashSet::with_capacity(raw.samples.len());
    let mut samples = Vec::with_capacity(raw.samples.len());
    for sample in &raw.samples {
        if !seen.insert(sample.name.as_str()) {
            return Err(Error::DuplicateSampleName {
                channel: raw.name.clone(),
                sample: sample.name.clone(),
            });
        }
        if sample.data.len() != n_bins {
            return Err(Error::BinCountMismatch {
                channel: raw.name.clone(),
                sample: sample.name.clone(),
                expected: n_bins,
                got: sample.data.len(),
            });
        }
        let counts = build_sample(sample, registry, &raw.name, bin_offset)?;
        samples.push((sample.name.clone(), counts));
    }

    tracing::debug!(channel = %raw.name, n_bins, n_samples = samples.len(), "channel built");
    Ok(BuiltChannel { name: raw.name.clone(), offset: bin_offset, n_bins, samples })
}
