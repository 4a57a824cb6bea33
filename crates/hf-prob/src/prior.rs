//! Priors attached to model parameters.
//!
//! Every parameter slot of an assembled model carries one [`Prior`]. The
//! likelihood constructor only needs [`Prior::logpdf`]; samplers additionally
//! use [`Prior::rand`] and the support bounds.

use hf_core::{Error, Result};
use rand::Rng;
use rand_distr::Distribution;
use serde::{Deserialize, Serialize};

/// `ln(sqrt(2π))`.
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Prior distribution of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "lowercase")]
pub enum Prior {
    /// Gaussian constraint `N(mu, sigma)`.
    Normal {
        /// Centre.
        mu: f64,
        /// Width (> 0).
        sigma: f64,
    },
    /// Poisson constraint with rate `lambda`, evaluated on the continuous extension.
    Poisson {
        /// Rate (>= 0).
        lambda: f64,
    },
    /// Pseudo-flat prior on `[a, b]`.
    ///
    /// `logpdf` is zero everywhere, so it never contributes a constraint term;
    /// `rand`, `minimum` and `maximum` behave like `Uniform(a, b)`.
    Flat {
        /// Lower edge.
        a: f64,
        /// Upper edge (>= a).
        b: f64,
    },
}

impl Prior {
    /// Validated `N(mu, sigma)`.
    pub fn normal(mu: f64, sigma: f64) -> Result<Self> {
        if !mu.is_finite() {
            return Err(Error::Validation(format!("normal prior mu must be finite, got {}", mu)));
        }
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::Validation(format!(
                "normal prior sigma must be finite and > 0, got {}",
                sigma
            )));
        }
        Ok(Self::Normal { mu, sigma })
    }

    /// Validated `Poisson(lambda)`.
    pub fn poisson(lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(Error::Validation(format!(
                "poisson prior lambda must be finite and >= 0, got {}",
                lambda
            )));
        }
        Ok(Self::Poisson { lambda })
    }

    /// Validated flat prior on `[a, b]`. `a == b` pins the parameter.
    pub fn flat(a: f64, b: f64) -> Result<Self> {
        if !a.is_finite() || !b.is_finite() || a > b {
            return Err(Error::Validation(format!("flat prior needs finite a <= b, got [{}, {}]", a, b)));
        }
        Ok(Self::Flat { a, b })
    }

    /// Whether this prior contributes nothing to the constraint term.
    pub fn is_flat(&self) -> bool {
        matches!(self, Self::Flat { .. })
    }

    /// Log-density at `x`.
    pub fn logpdf(&self, x: f64) -> Result<f64> {
        match *self {
            Self::Normal { mu, sigma } => {
                if !sigma.is_finite() || sigma <= 0.0 {
                    return Err(Error::Validation(format!("sigma must be finite and > 0, got {}", sigma)));
                }
                let z = (x - mu) / sigma;
                Ok(-0.5 * z * z - sigma.ln() - LN_SQRT_2PI)
            }
            Self::Poisson { lambda } => crate::poisson::logpdf_continuous(x, lambda),
            Self::Flat { .. } => Ok(0.0),
        }
    }

    /// One random draw.
    pub fn rand<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        match *self {
            Self::Normal { mu, sigma } => {
                let d = rand_distr::Normal::new(mu, sigma)
                    .map_err(|e| Error::Validation(format!("normal prior: {}", e)))?;
                Ok(d.sample(rng))
            }
            Self::Poisson { lambda } => {
                if lambda == 0.0 {
                    return Ok(0.0);
                }
                let d = rand_distr::Poisson::new(lambda)
                    .map_err(|e| Error::Validation(format!("poisson prior: {}", e)))?;
                Ok(d.sample(rng))
            }
            Self::Flat { a, b } => {
                if a == b {
                    Ok(a)
                } else {
                    Ok(rng.random_range(a..=b))
                }
            }
        }
    }

    /// Lower edge of the support.
    pub fn minimum(&self) -> f64 {
        match *self {
            Self::Normal { .. } => f64::NEG_INFINITY,
            Self::Poisson { .. } => 0.0,
            Self::Flat { a, .. } => a,
        }
    }

    /// Upper edge of the support.
    pub fn maximum(&self) -> f64 {
        match *self {
            Self::Normal { .. } | Self::Poisson { .. } => f64::INFINITY,
            Self::Flat { b, .. } => b,
        }
    }

    /// Mean of the distribution (centre of the flat interval).
    pub fn mean(&self) -> f64 {
        match *self {
            Self::Normal { mu, .. } => mu,
            Self::Poisson { lambda } => lambda,
            Self::Flat { a, b } => 0.5 * (a + b),
        }
    }
}
