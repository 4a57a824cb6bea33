//! Modifier registry
//!
//! Single-owner accumulator used while channels are built. Every modifier
//! registration is merged by name: equal names become one logical parameter
//! whatever sample or channel declares them. Once all channels are built the
//! registry is frozen into an ordered parameter table, which is the only
//! thing the compiled model captures.

use super::modifier::{ModifierData, ModifierKind, ModifierRef, build_modifier_auto};
use super::options::BuildOptions;
use super::schema::{MeasurementConfig, Modifier, ParameterConfig, element};
use hf_core::{Error, Result};
use hf_prob::Prior;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug)]
struct Entry {
    name: String,
    kind: ModifierKind,
    /// 1 for scalar kinds, the bin count for per-bin kinds.
    n_slots: usize,
    /// Global bins each slot acts on (bin-to-identity map).
    bins: Vec<Vec<usize>>,
    /// Σ nominal over contributing samples (shapesys/staterror).
    sum_nominal: Vec<f64>,
    /// Σ δ² over contributing samples (shapesys/staterror).
    sum_delta_sq: Vec<f64>,
}

/// Accumulates modifier registrations across samples and channels.
#[derive(Debug)]
pub struct ModifierRegistry<'a> {
    config: Option<&'a MeasurementConfig>,
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

/// One parameter slot of an assembled model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Slot name: the modifier name, or `name[i]` for per-bin modifiers.
    pub name: String,
    /// Modifier the slot belongs to.
    pub modifier: String,
    /// Kind of that modifier.
    pub kind: ModifierKind,
    /// Prior of the slot.
    pub prior: Prior,
    /// Starting value (neutral value unless overridden by the measurement).
    pub init: f64,
    /// Global bins this slot acts on.
    pub bins: Vec<usize>,
}

/// Frozen, ordered parameter set.
#[derive(Debug, Clone)]
pub struct ParameterTable {
    /// Slots in encounter order.
    pub parameters: Vec<Parameter>,
    first_slot: HashMap<String, usize>,
}

impl ParameterTable {
    /// Index of the first slot of modifier `name`.
    pub fn first_slot(&self, name: &str) -> Option<usize> {
        self.first_slot.get(name).copied()
    }
}

impl<'a> ModifierRegistry<'a> {
    /// Empty registry; `config` supplies lumi widths, bounds and inits.
    pub fn new(config: Option<&'a MeasurementConfig>) -> Self {
        Self { config, entries: Vec::new(), by_name: HashMap::new() }
    }

    fn parameter_config(&self, name: &str) -> Option<&'a ParameterConfig> {
        self.config.and_then(|c| c.parameter(name))
    }

    /// Number of distinct modifier names registered so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of parameter slots the registered modifiers will occupy.
    pub fn n_slots(&self) -> usize {
        self.entries.iter().map(|e| e.n_slots).sum()
    }

    /// Build `raw` for a sample with `nominal` yields whose first bin sits at
    /// global index `bin_offset`, and merge it into the registry.
    pub fn register(
        &mut self,
        raw: &Modifier,
        nominal: &[f64],
        bin_offset: usize,
        channel: &str,
        sample: &str,
    ) -> Result<ModifierRef> {
        let mut modifier = build_modifier_auto(raw)?;
        let kind = modifier.kind;
        modifier.validate_bins(channel, sample, nominal.len())?;

        if let ModifierData::Lumi { sigma } = &mut modifier.data {
            *sigma = self.parameter_config(&raw.name).and_then(|cfg| element(&cfg.sigmas, 0));
        }

        let n_bins = nominal.len();
        let idx = match self.by_name.get(&raw.name) {
            Some(&idx) => {
                let entry = &self.entries[idx];
                if entry.kind != kind {
                    return Err(Error::ModifierConflict {
                        name: raw.name.clone(),
                        reason: format!(
                            "declared as {} in channel '{}' sample '{}' but registered earlier as {}",
                            kind, channel, sample, entry.kind
                        ),
                    });
                }
                if kind.is_per_bin() && entry.n_slots != n_bins {
                    return Err(Error::ModifierConflict {
                        name: raw.name.clone(),
                        reason: format!(
                            "per-bin {} spans {} bins in channel '{}' but {} bins elsewhere",
                            kind, n_bins, channel, entry.n_slots
                        ),
                    });
                }
                tracing::debug!(modifier = %raw.name, %kind, channel, sample, "merged into existing parameter");
                idx
            }
            None => {
                let n_slots = if kind.is_per_bin() { n_bins } else { 1 };
                self.entries.push(Entry {
                    name: raw.name.clone(),
                    kind,
                    n_slots,
                    bins: vec![Vec::new(); n_slots],
                    sum_nominal: Vec::new(),
                    sum_delta_sq: Vec::new(),
                });
                self.by_name.insert(raw.name.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        for local in 0..n_bins {
            let slot = if kind.is_per_bin() { local } else { 0 };
            let global = bin_offset + local;
            if !entry.bins[slot].contains(&global) {
                entry.bins[slot].push(global);
            }
        }

        if let ModifierData::Shapesys { delta } | ModifierData::Staterror { delta } = &modifier.data {
            if entry.sum_nominal.is_empty() {
                entry.sum_nominal = vec![0.0; n_bins];
                entry.sum_delta_sq = vec![0.0; n_bins];
            }
            for (k, (&nom, &d)) in nominal.iter().zip(delta).enumerate() {
                entry.sum_nominal[k] += nom;
                entry.sum_delta_sq[k] += d * d;
            }
        }

        Ok(modifier)
    }

    /// Freeze into the ordered parameter table, constructing one prior per slot.
    pub fn freeze(self, options: &BuildOptions) -> Result<ParameterTable> {
        let mut parameters = Vec::with_capacity(self.n_slots());
        let mut first_slot = HashMap::with_capacity(self.entries.len());

        for entry in &self.entries {
            first_slot.insert(entry.name.clone(), parameters.len());
            let cfg = self.parameter_config(&entry.name);

            for k in 0..entry.n_slots {
                let name = if entry.kind.is_per_bin() {
                    format!("{}[{}]", entry.name, k)
                } else {
                    entry.name.clone()
                };
                let mut init = cfg
                    .and_then(|c| element(&c.inits, k))
                    .unwrap_or_else(|| entry.kind.neutral_value());
                let mut prior = slot_prior(entry, k, cfg, options)?;

                if cfg.is_some_and(|c| c.fixed) {
                    prior = Prior::flat(init, init)?;
                } else if let Prior::Flat { a, b } = prior
                    && a == b
                {
                    init = a;
                }

                parameters.push(Parameter {
                    name,
                    modifier: entry.name.clone(),
                    kind: entry.kind,
                    prior,
                    init,
                    bins: entry.bins[k].clone(),
                });
            }
        }

        Ok(ParameterTable { parameters, first_slot })
    }
}

fn flat_prior(cfg: Option<&ParameterConfig>, k: usize, options: &BuildOptions) -> Result<Prior> {
    let [a, b] = cfg.and_then(|c| element(&c.bounds, k)).unwrap_or(options.flat_range);
    Prior::flat(a, b)
}

fn slot_prior(
    entry: &Entry,
    k: usize,
    cfg: Option<&ParameterConfig>,
    options: &BuildOptions,
) -> Result<Prior> {
    match entry.kind {
        ModifierKind::Normfactor | ModifierKind::Shapefactor => flat_prior(cfg, k, options),
        ModifierKind::Normsys | ModifierKind::Histosys => Prior::normal(0.0, 1.0),
        ModifierKind::Shapesys | ModifierKind::Staterror => {
            let nom = entry.sum_nominal.get(k).copied().unwrap_or(0.0);
            let delta = entry.sum_delta_sq.get(k).copied().unwrap_or(0.0).sqrt();
            let sigma = if nom > 0.0 { delta / nom } else { 0.0 };
            if sigma > 0.0 && sigma.is_finite() {
                Prior::normal(1.0, sigma)
            } else {
                // No uncertainty: the factor is pinned at 1.
                Prior::flat(1.0, 1.0)
            }
        }
        ModifierKind::Lumi => match cfg.and_then(|c| element(&c.sigmas, 0)) {
            Some(sigma) => {
                let mu = cfg.and_then(|c| element(&c.auxdata, 0)).unwrap_or(1.0);
                Prior::normal(mu, sigma)
            }
            None => flat_prior(cfg, k, options),
        },
    }
}
