//! Model assembly
//!
//! Turns a [`Workspace`] into a [`PyhfModel`]: the compiled [`Expected`] yield
//! function together with one [`Parameter`] (name, prior, init) per slot.
//! Slot order is modifier encounter order across channels and samples, and
//! bin order is channel declaration order; both are fixed at assembly.

use super::channel::{BuiltChannel, build_channel};
use super::interp::{
    AdditiveCode, MultiplicativeCode, additive_delta, effective_multiplicative_code, eval_multiplicative,
    identity_interp,
};
use super::modifier::{ModifierData, ModifierRef};
use super::options::BuildOptions;
use super::registry::{ModifierRegistry, Parameter, ParameterTable};
use super::schema::Workspace;
use hf_core::{Error, ExpectedYields, Model, Result};
use hf_prob::Prior;
use serde::Serialize;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

/// Modifier with its parameter slots resolved.
#[derive(Debug, Clone)]
enum CompiledModifier {
    /// Scalar factor read straight from one slot (normfactor, lumi).
    Factor { slot: usize },
    /// Per-bin factors (shapefactor, shapesys, staterror).
    BinFactors { slots: Vec<usize> },
    /// `code` is resolved per `(lo, hi)` at assembly.
    Normsys { slot: usize, lo: f64, hi: f64, code: MultiplicativeCode },
    Histosys { slot: usize, lo_data: Vec<f64>, hi_data: Vec<f64> },
}

#[derive(Debug, Clone)]
struct CompiledSample {
    nominal: Vec<f64>,
    modifiers: Vec<CompiledModifier>,
}

#[derive(Debug, Clone)]
struct CompiledChannel {
    n_bins: usize,
    samples: Vec<CompiledSample>,
}

#[derive(Debug)]
struct ExpectedInner {
    channels: Vec<CompiledChannel>,
    n_params: usize,
    n_bins: usize,
    histosys_code: AdditiveCode,
}

/// Compiled `expected(αs)` function.
///
/// Holds only immutable data behind an [`Arc`]: clones are cheap and every
/// clone may be evaluated from any thread concurrently.
#[derive(Debug, Clone)]
pub struct Expected {
    inner: Arc<ExpectedInner>,
}

impl Expected {
    /// Number of parameter slots.
    pub fn n_params(&self) -> usize {
        self.inner.n_params
    }

    /// Total bins across all channels.
    pub fn n_bins(&self) -> usize {
        self.inner.n_bins
    }

    /// Expected counts, channels concatenated in declaration order.
    ///
    /// Negative or NaN yields are returned as computed.
    pub fn eval(&self, params: &[f64]) -> Result<Vec<f64>> {
        let inner = &*self.inner;
        if params.len() != inner.n_params {
            return Err(Error::ParameterCountMismatch { expected: inner.n_params, got: params.len() });
        }

        let mut out = Vec::with_capacity(inner.n_bins);
        for channel in &inner.channels {
            let mut totals = vec![0.0; channel.n_bins];
            for sample in &channel.samples {
                let nominal = &sample.nominal;
                let mut deltas = vec![0.0; nominal.len()];
                let mut factors = vec![1.0; nominal.len()];

                for modifier in &sample.modifiers {
                    match modifier {
                        CompiledModifier::Factor { slot } => {
                            let v = identity_interp(params[*slot]);
                            factors.iter_mut().for_each(|f| *f *= v);
                        }
                        CompiledModifier::BinFactors { slots } => {
                            for (f, &slot) in factors.iter_mut().zip(slots) {
                                *f *= identity_interp(params[slot]);
                            }
                        }
                        CompiledModifier::Normsys { slot, lo, hi, code } => {
                            let v = eval_multiplicative(*code, *lo, *hi, params[*slot]);
                            factors.iter_mut().for_each(|f| *f *= v);
                        }
                        CompiledModifier::Histosys { slot, lo_data, hi_data } => {
                            let alpha = params[*slot];
                            for k in 0..nominal.len() {
                                deltas[k] +=
                                    additive_delta(inner.histosys_code, lo_data[k], nominal[k], hi_data[k], alpha);
                            }
                        }
                    }
                }

                for k in 0..nominal.len() {
                    totals[k] += (nominal[k] + deltas[k]) * factors[k];
                }
            }
            out.extend(totals);
        }

        Ok(out)
    }

    /// Closure form of [`Expected::eval`].
    pub fn as_fn(&self) -> impl Fn(&[f64]) -> Result<Vec<f64>> + Send + Sync + Clone + 'static {
        let this = self.clone();
        move |params: &[f64]| this.eval(params)
    }
}

impl ExpectedYields for Expected {
    fn n_params(&self) -> usize {
        self.inner.n_params
    }

    fn n_bins(&self) -> usize {
        self.inner.n_bins
    }

    fn expected(&self, params: &[f64]) -> Result<Vec<f64>> {
        self.eval(params)
    }
}

/// Bin layout of one channel in the concatenated output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelInfo {
    /// Channel name.
    pub name: String,
    /// Global index of the first bin.
    pub offset: usize,
    /// Number of bins.
    pub n_bins: usize,
    /// Sample names in declaration order.
    pub samples: Vec<String>,
}

impl ChannelInfo {
    /// Global bin range of this channel.
    pub fn bins(&self) -> Range<usize> {
        self.offset..self.offset + self.n_bins
    }
}

/// Assembled model: `expected`, priors and names, index-aligned.
#[derive(Debug, Clone)]
pub struct PyhfModel {
    expected: Expected,
    parameters: Vec<Parameter>,
    channels: Vec<ChannelInfo>,
    poi: Option<String>,
}

impl PyhfModel {
    /// Compiled yield function.
    pub fn expected(&self) -> &Expected {
        &self.expected
    }

    /// One prior per slot.
    pub fn priors(&self) -> Vec<Prior> {
        self.parameters.iter().map(|p| p.prior).collect()
    }

    /// One name per slot.
    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    /// Full slot records.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Starting point: neutral values, overridden by measurement `inits`.
    pub fn inits(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.init).collect()
    }

    /// Number of parameter slots.
    pub fn n_params(&self) -> usize {
        self.parameters.len()
    }

    /// Total bins across all channels.
    pub fn n_bins(&self) -> usize {
        self.expected.n_bins()
    }

    /// Channel layout in output order.
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    /// Slot index of `name`.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    /// Slot index of the measurement's parameter of interest.
    pub fn poi_index(&self) -> Option<usize> {
        self.poi.as_deref().and_then(|poi| self.param_index(poi))
    }

    /// Workspace observations reordered into channel order and concatenated.
    pub fn observed(&self, ws: &Workspace) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.n_bins());
        for channel in &self.channels {
            let obs = ws
                .observations
                .iter()
                .find(|o| o.name == channel.name)
                .ok_or_else(|| Error::Validation(format!("No observation for channel '{}'", channel.name)))?;
            if obs.data.len() != channel.n_bins {
                return Err(Error::BinCountMismatch {
                    channel: channel.name.clone(),
                    sample: "observation".to_string(),
                    expected: channel.n_bins,
                    got: obs.data.len(),
                });
            }
            out.extend_from_slice(&obs.data);
        }
        Ok(out)
    }

    /// Split into the aligned `(expected, priors, names)` triple.
    pub fn into_parts(self) -> (Expected, Vec<Prior>, Vec<String>) {
        let priors = self.priors();
        let names = self.names();
        (self.expected, priors, names)
    }
}

impl Model for PyhfModel {
    fn n_parameters(&self) -> usize {
        self.parameters.len()
    }

    fn parameter_names(&self) -> Vec<String> {
        self.names()
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        self.parameters.iter().map(|p| (p.prior.minimum(), p.prior.maximum())).collect()
    }
}

fn compile_modifier(m: &ModifierRef, table: &ParameterTable, options: &BuildOptions) -> Result<CompiledModifier> {
    let slot = table
        .first_slot(&m.name)
        .ok_or_else(|| Error::Validation(format!("Modifier '{}' has no parameter slot", m.name)))?;
    Ok(match &m.data {
        ModifierData::Normfactor | ModifierData::Lumi { .. } => CompiledModifier::Factor { slot },
        ModifierData::Shapefactor => {
            let n = table.parameters.iter().filter(|p| p.modifier == m.name).count();
            CompiledModifier::BinFactors { slots: (slot..slot + n).collect() }
        }
        ModifierData::Shapesys { delta } | ModifierData::Staterror { delta } => {
            CompiledModifier::BinFactors { slots: (slot..slot + delta.len()).collect() }
        }
        ModifierData::Normsys { lo, hi } => {
            let code = effective_multiplicative_code(options.normsys_interp, *lo, *hi);
            if code != options.normsys_interp {
                tracing::debug!(modifier = %m.name, lo, hi, "code4 not monotonic for this variation, using code1");
            }
            CompiledModifier::Normsys { slot, lo: *lo, hi: *hi, code }
        }
        ModifierData::Histosys { lo_data, hi_data } => {
            CompiledModifier::Histosys { slot, lo_data: lo_data.clone(), hi_data: hi_data.clone() }
        }
    })
}

fn compile_channel(channel: &BuiltChannel, table: &ParameterTable, options: &BuildOptions) -> Result<CompiledChannel> {
    let samples = channel
        .samples
        .iter()
        .map(|(_, counts)| {
            let modifiers = counts
                .modifiers
                .iter()
                .map(|m| compile_modifier(m, table, options))
                .collect::<Result<Vec<_>>>()?;
            Ok(CompiledSample { nominal: counts.nominal.clone(), modifiers })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CompiledChannel { n_bins: channel.n_bins, samples })
}

/// Assemble a model with default [`BuildOptions`].
pub fn build_pyhf(ws: &Workspace) -> Result<PyhfModel> {
    build_pyhf_with(ws, &BuildOptions::default())
}

/// Assemble from an already-parsed JSON mapping.
pub fn build_pyhf_value(value: &serde_json::Value) -> Result<PyhfModel> {
    build_pyhf(&Workspace::from_value(value)?)
}

/// Assemble a model.
///
/// All structural errors (unknown modifier kinds, conflicting modifier
/// declarations, duplicate samples, bin count mismatches) are raised here,
/// before any `expected` exists.
pub fn build_pyhf_with(ws: &Workspace, options: &BuildOptions) -> Result<PyhfModel> {
    options.validate()?;
    if ws.channels.is_empty() {
        return Err(Error::Validation("Workspace has no channels".to_string()));
    }

    let measurement = match options.measurement.as_deref() {
        Some(name) => Some(
            ws.measurement(Some(name))
                .ok_or_else(|| Error::Validation(format!("Unknown measurement '{}'", name)))?,
        ),
        None => ws.measurement(None),
    };

    let mut registry = ModifierRegistry::new(measurement.map(|m| &m.config));
    let mut seen = HashSet::with_capacity(ws.channels.len());
    let mut built = Vec::with_capacity(ws.channels.len());
    let mut offset = 0;
    for raw in &ws.channels {
        if !seen.insert(raw.name.as_str()) {
            return Err(Error::Validation(format!("Duplicate channel name '{}'", raw.name)));
        }
        let channel = build_channel(raw, &mut registry, offset)?;
        offset += channel.n_bins;
        built.push(channel);
    }
    let n_bins = offset;

    let table = registry.freeze(options)?;
    let channels = built.iter().map(|c| compile_channel(c, &table, options)).collect::<Result<Vec<_>>>()?;
    let infos = built
        .into_iter()
        .map(|c| ChannelInfo {
            name: c.name,
            offset: c.offset,
            n_bins: c.n_bins,
            samples: c.samples.into_iter().map(|(name, _)| name).collect(),
        })
        .collect::<Vec<_>>();

    let poi = measurement.map(|m| m.config.poi.clone()).filter(|p| !p.is_empty());
    if let Some(poi) = &poi
        && table.first_slot(poi).is_none()
    {
        tracing::warn!(poi = %poi, "parameter of interest is not declared by any modifier");
    }

    let parameters = table.parameters;
    tracing::info!(
        channels = infos.len(),
        bins = n_bins,
        parameters = parameters.len(),
        "pyhf model assembled"
    );

    let expected = Expected {
        inner: Arc::new(ExpectedInner {
            channels,
            n_params: parameters.len(),
            n_bins,
            histosys_code: options.histosys_interp,
        }),
    };
    Ok(PyhfModel { expected, parameters, channels: infos, poi })
}
