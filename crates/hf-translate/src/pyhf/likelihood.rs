//! Log-likelihood constructor
//!
//! Binned Poisson data term, `Σ obs·ln(exp) - exp` with `ln Γ(obs+1)`
//! dropped, optionally plus `Σ prior.logpdf(α)` over all slots. Flat priors
//! contribute zero, so they need no special casing.

use hf_core::{Error, ExpectedYields, Result};
use hf_prob::Prior;
use hf_prob::poisson::log_kernel;
use rayon::prelude::*;

/// Callable log-likelihood over a fixed observed dataset.
#[derive(Debug, Clone)]
pub struct LogLikelihood<E> {
    expected: E,
    observed: Vec<f64>,
    priors: Option<Vec<Prior>>,
}

/// Data term only.
pub fn loglikelihood<E: ExpectedYields>(expected: E, observed: &[f64]) -> Result<LogLikelihood<E>> {
    check_observed(&expected, observed)?;
    Ok(LogLikelihood { expected, observed: observed.to_vec(), priors: None })
}

/// Data term plus one constraint term per prior.
pub fn loglikelihood_with_priors<E: ExpectedYields>(
    expected: E,
    observed: &[f64],
    priors: &[Prior],
) -> Result<LogLikelihood<E>> {
    check_observed(&expected, observed)?;
    if priors.len() != expected.n_params() {
        return Err(Error::DimensionMismatch {
            what: "priors vs parameters",
            expected: expected.n_params(),
            got: priors.len(),
        });
    }
    Ok(LogLikelihood { expected, observed: observed.to_vec(), priors: Some(priors.to_vec()) })
}

fn check_observed<E: ExpectedYields>(expected: &E, observed: &[f64]) -> Result<()> {
    if observed.len() != expected.n_bins() {
        return Err(Error::DimensionMismatch {
            what: "observed vs expected bins",
            expected: expected.n_bins(),
            got: observed.len(),
        });
    }
    Ok(())
}

impl<E: ExpectedYields> LogLikelihood<E> {
    /// Underlying yield function.
    pub fn expected(&self) -> &E {
        &self.expected
    }

    /// Observed counts.
    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    /// Whether constraint terms are included.
    pub fn is_constrained(&self) -> bool {
        self.priors.is_some()
    }

    /// Log-likelihood at `params`.
    pub fn eval(&self, params: &[f64]) -> Result<f64> {
        if let Some(priors) = &self.priors
            && params.len() != priors.len()
        {
            return Err(Error::DimensionMismatch {
                what: "parameters vs priors",
                expected: priors.len(),
                got: params.len(),
            });
        }

        let exp = self.expected.expected(params)?;
        if exp.len() != self.observed.len() {
            return Err(Error::DimensionMismatch {
                what: "observed vs expected bins",
                expected: exp.len(),
                got: self.observed.len(),
            });
        }

        let mut ll: f64 = self.observed.iter().zip(&exp).map(|(&obs, &e)| log_kernel(obs, e)).sum();
        if let Some(priors) = &self.priors {
            for (prior, &x) in priors.iter().zip(params) {
                ll += prior.logpdf(x)?;
            }
        }
        Ok(ll)
    }

    /// Evaluate several points in parallel.
    pub fn eval_many(&self, points: &[Vec<f64>]) -> Result<Vec<f64>> {
        points.par_iter().map(|p| self.eval(p)).collect()
    }

    /// Gradient by central finite differences, one parameter per task.
    pub fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let n = params.len();
        if n != self.expected.n_params() {
            return Err(Error::ParameterCountMismatch { expected: self.expected.n_params(), got: n });
        }

        (0..n)
            .into_par_iter()
            .map(|i| {
                let eps = 1e-8_f64.sqrt() * params[i].abs().max(1.0);

                let mut params_plus = params.to_vec();
                params_plus[i] += eps;
                let f_plus = self.eval(&params_plus)?;

                let mut params_minus = params.to_vec();
                params_minus[i] -= eps;
                let f_minus = self.eval(&params_minus)?;

                Ok((f_plus - f_minus) / (2.0 * eps))
            })
            .collect::<Result<Vec<f64>>>()
    }
}

impl<E: ExpectedYields + Clone + 'static> LogLikelihood<E> {
    /// Closure form of [`LogLikelihood::eval`], for drivers that take a plain function.
    pub fn as_fn(&self) -> impl Fn(&[f64]) -> Result<f64> + Send + Sync + Clone + 'static {
        let this = self.clone();
        move |params: &[f64]| this.eval(params)
    }
}
