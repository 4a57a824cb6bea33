//! Poisson distribution utilities.
//!
//! Binned likelihoods evaluate the Poisson density at non-integer "counts"
//! (Asimov data, auxiliary measurements), so a continuous extension via
//! `ln Γ(k+1)` is provided next to the integer PMF.

use hf_core::{Error, Result};
use statrs::function::gamma::ln_gamma;

fn check_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(Error::Validation(format!("lambda must be finite and >= 0, got {}", lambda)));
    }
    Ok(())
}

/// Log-PMF of Poisson(k | lambda).
pub fn logpmf(k: u64, lambda: f64) -> Result<f64> {
    logpdf_continuous(k as f64, lambda)
}

/// Continuous extension `x ln(lambda) - lambda - ln Γ(x+1)` for real `x >= 0`.
///
/// Returns `-inf` for negative `x`. At `lambda == 0` the density is a point
/// mass at zero.
pub fn logpdf_continuous(x: f64, lambda: f64) -> Result<f64> {
    check_lambda(lambda)?;
    if x < 0.0 {
        return Ok(f64::NEG_INFINITY);
    }
    if lambda == 0.0 {
        return Ok(if x == 0.0 { 0.0 } else { f64::NEG_INFINITY });
    }
    Ok(x * lambda.ln() - lambda - ln_gamma(x + 1.0))
}

/// Poisson log-likelihood with the `ln Γ(obs+1)` term dropped.
///
/// `obs * ln(exp) - exp`, the kernel used by the binned data term. `obs == 0`
/// contributes `-exp` even when `exp == 0`.
#[inline]
pub fn log_kernel(obs: f64, exp: f64) -> f64 {
    if obs == 0.0 { -exp } else { obs * exp.ln() - exp }
}
