//! Interpolation library
//!
//! Maps a nuisance-parameter value `α` to a multiplicative factor (normsys)
//! or an additive per-bin shift (histosys). Every scheme reproduces the
//! neutral value at `α = 0` and the stored variation at `α = ±1` exactly.

use serde::{Deserialize, Serialize};

/// Interpolation scheme for multiplicative (normsys-like) modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplicativeCode {
    /// Piecewise exponential: `hi^α` for `α >= 0`, `lo^-α` below.
    Code1,
    /// Sixth-order polynomial inside `|α| < 1`, exponential outside.
    #[default]
    Code4,
}

/// Interpolation scheme for additive (histosys-like) modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdditiveCode {
    /// Piecewise linear.
    Code0,
    /// Polynomial inside `|α| < 1`, linear outside.
    #[default]
    Code4p,
}

/// Unconstrained modifiers (normfactor, shapefactor) pass the parameter through.
#[inline]
pub fn identity_interp(alpha: f64) -> f64 {
    alpha
}

/// Modifiers without shape morphing (lumi, shapesys, staterror): the
/// parameter scales a fixed quantity and no interpolation happens.
#[inline]
pub fn two_arg_identity(x: f64, _alpha: f64) -> f64 {
    x
}

/// Default multiplicative interpolation (`code4`).
///
/// `f(0) = 1`, `f(1) = hi`, `f(-1) = lo`.
pub fn multiplicative_interp(lo: f64, hi: f64, alpha: f64) -> f64 {
    multiplicative_interp_with(MultiplicativeCode::Code4, lo, hi, alpha)
}

/// Multiplicative interpolation with an explicit scheme.
///
/// The requested scheme goes through [`effective_multiplicative_code`] first.
pub fn multiplicative_interp_with(code: MultiplicativeCode, lo: f64, hi: f64, alpha: f64) -> f64 {
    eval_multiplicative(effective_multiplicative_code(code, lo, hi), lo, hi, alpha)
}

/// Scheme actually used for one `(lo, hi)` pair.
///
/// When `lo < 1 < hi` or `hi < 1 < lo`, `code4` keeps its polynomial only if
/// the polynomial is proven monotonic on `[-1, 1]`. Otherwise the pair is
/// evaluated with `code1`, which shares the exponential tails.
pub fn effective_multiplicative_code(code: MultiplicativeCode, lo: f64, hi: f64) -> MultiplicativeCode {
    match code {
        MultiplicativeCode::Code4 if lo > 0.0 && hi > 0.0 => {
            let sign = if lo < 1.0 && 1.0 < hi {
                1.0
            } else if hi < 1.0 && 1.0 < lo {
                -1.0
            } else {
                return code;
            };
            let slope = code4_slope_bernstein(&code4_coeffs(hi, lo), sign);
            if is_nonnegative(&slope, MONOTONIC_SPLIT_DEPTH) { code } else { MultiplicativeCode::Code1 }
        }
        _ => code,
    }
}

/// Evaluate a scheme already resolved by [`effective_multiplicative_code`].
pub(crate) fn eval_multiplicative(code: MultiplicativeCode, lo: f64, hi: f64, alpha: f64) -> f64 {
    // Non-positive factors have no logarithm; fall back to a linear blend
    // written so that the knots come out exactly.
    if hi <= 0.0 || lo <= 0.0 {
        return if alpha >= 0.0 { hi * alpha + (1.0 - alpha) } else { lo * (-alpha) + (1.0 + alpha) };
    }
    match code {
        MultiplicativeCode::Code1 => code1(lo, hi, alpha),
        MultiplicativeCode::Code4 => code4(lo, hi, alpha),
    }
}

/// Default additive interpolation (`code4p`) over whole templates.
///
/// Returns per-bin shifts: `0` at `α = 0`, `hi - nominal` at `α = 1`,
/// `lo - nominal` at `α = -1`. The three slices must share one length.
pub fn additive_interp(lo_data: &[f64], nominal: &[f64], hi_data: &[f64], alpha: f64) -> Vec<f64> {
    additive_interp_with(AdditiveCode::Code4p, lo_data, nominal, hi_data, alpha)
}

/// Additive interpolation over whole templates with an explicit scheme.
pub fn additive_interp_with(
    code: AdditiveCode,
    lo_data: &[f64],
    nominal: &[f64],
    hi_data: &[f64],
    alpha: f64,
) -> Vec<f64> {
    debug_assert_eq!(lo_data.len(), nominal.len());
    debug_assert_eq!(hi_data.len(), nominal.len());
    nominal
        .iter()
        .zip(lo_data.iter().zip(hi_data))
        .map(|(&nom, (&lo, &hi))| additive_delta(code, lo, nom, hi, alpha))
        .collect()
}

/// Single-bin additive shift.
#[inline]
pub fn additive_delta(code: AdditiveCode, lo: f64, nom: f64, hi: f64, alpha: f64) -> f64 {
    match code {
        AdditiveCode::Code0 => code0(lo, nom, hi, alpha),
        AdditiveCode::Code4p => code4p(lo, nom, hi, alpha),
    }
}

fn code0(lo: f64, nom: f64, hi: f64, alpha: f64) -> f64 {
    if alpha >= 0.0 { alpha * (hi - nom) } else { alpha * (nom - lo) }
}

fn code1(lo: f64, hi: f64, alpha: f64) -> f64 {
    // powf(x, 1.0) == x exactly, which keeps the ±1 endpoints bit-exact.
    if alpha >= 0.0 { hi.powf(alpha) } else { lo.powf(-alpha) }
}

/// Polynomial coefficients of `code4` with `alpha0 = 1`.
fn code4_coeffs(hi: f64, lo: f64) -> [f64; 6] {
    const A_INV: [[f64; 6]; 6] = [
        [15.0 / 16.0, -15.0 / 16.0, -7.0 / 16.0, -7.0 / 16.0, 1.0 / 16.0, -1.0 / 16.0],
        [3.0 / 2.0, 3.0 / 2.0, -9.0 / 16.0, 9.0 / 16.0, 1.0 / 16.0, 1.0 / 16.0],
        [-5.0 / 8.0, 5.0 / 8.0, 5.0 / 8.0, 5.0 / 8.0, -1.0 / 8.0, 1.0 / 8.0],
        [-3.0 / 2.0, -3.0 / 2.0, 7.0 / 8.0, -7.0 / 8.0, -1.0 / 8.0, -1.0 / 8.0],
        [3.0 / 16.0, -3.0 / 16.0, -3.0 / 16.0, -3.0 / 16.0, 1.0 / 16.0, -1.0 / 16.0],
        [1.0 / 2.0, 1.0 / 2.0, -5.0 / 16.0, 5.0 / 16.0, 1.0 / 16.0, 1.0 / 16.0],
    ];

    let ln_hi = hi.ln();
    let ln_lo = lo.ln();
    let b = [hi - 1.0, lo - 1.0, hi * ln_hi, -lo * ln_lo, hi * ln_hi * ln_hi, lo * ln_lo * ln_lo];

    let mut a = [0.0; 6];
    for r in 0..6 {
        a[r] = A_INV[r].iter().zip(&b).map(|(m, v)| m * v).sum();
    }
    a
}

const MONOTONIC_SPLIT_DEPTH: u32 = 12;

const BINOM: [[f64; 6]; 6] = [
    [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    [1.0, 2.0, 1.0, 0.0, 0.0, 0.0],
    [1.0, 3.0, 3.0, 1.0, 0.0, 0.0],
    [1.0, 4.0, 6.0, 4.0, 1.0, 0.0],
    [1.0, 5.0, 10.0, 10.0, 5.0, 1.0],
];

/// `sign * f'(α)` of the `code4` polynomial as Bernstein coefficients of
/// degree 5 over `α = 2t - 1`, `t ∈ [0, 1]`.
fn code4_slope_bernstein(c: &[f64; 6], sign: f64) -> [f64; 6] {
    // f'(α) = Σ (k+1) c_k α^k
    let mut power = [0.0; 6];
    for k in 0..6 {
        let d = sign * (k as f64 + 1.0) * c[k];
        for j in 0..=k {
            let parity = if (k - j) % 2 == 0 { 1.0 } else { -1.0 };
            power[j] += d * BINOM[k][j] * 2f64.powi(j as i32) * parity;
        }
    }

    let mut bern = [0.0; 6];
    for i in 0..6 {
        bern[i] = (0..=i).map(|j| BINOM[i][j] / BINOM[5][j] * power[j]).sum();
    }
    bern
}

/// De Casteljau split at `t = 1/2`.
fn bernstein_halves(b: &[f64; 6]) -> ([f64; 6], [f64; 6]) {
    let mut left = [0.0; 6];
    let mut right = [0.0; 6];
    let mut w = *b;
    for r in 0..6 {
        left[r] = w[0];
        right[5 - r] = w[5 - r];
        for i in 0..5 - r {
            w[i] = 0.5 * (w[i] + w[i + 1]);
        }
    }
    (left, right)
}

/// Whether the polynomial is provably `>= 0` on its interval. Undecided
/// intervals at the depth limit count as negative.
fn is_nonnegative(b: &[f64; 6], depth: u32) -> bool {
    if b.iter().all(|&v| v >= 0.0) {
        return true;
    }
    if b[0] < 0.0 || b[5] < 0.0 || depth == 0 {
        return false;
    }
    let (left, right) = bernstein_halves(b);
    is_nonnegative(&left, depth - 1) && is_nonnegative(&right, depth - 1)
}

fn code4(lo: f64, hi: f64, alpha: f64) -> f64 {
    if alpha.abs() >= 1.0 {
        let base = if alpha >= 0.0 { hi } else { lo };
        return base.powf(alpha.abs());
    }

    let c = code4_coeffs(hi, lo);
    // Horner form of 1 + Σ c_k α^(k+1).
    let poly = c[5];
    let poly = poly * alpha + c[4];
    let poly = poly * alpha + c[3];
    let poly = poly * alpha + c[2];
    let poly = poly * alpha + c[1];
    let poly = poly * alpha + c[0];
    1.0 + poly * alpha
}

fn code4p(lo: f64, nom: f64, hi: f64, alpha: f64) -> f64 {
    let delta_up = hi - nom;
    let delta_dn = nom - lo;

    if alpha >= 1.0 {
        return delta_up * alpha;
    }
    if alpha <= -1.0 {
        return delta_dn * alpha;
    }

    let s = 0.5 * (delta_up + delta_dn);
    let a = 0.0625 * (delta_up - delta_dn);

    let asq = alpha * alpha;
    let tmp1 = asq * 3.0 - 10.0;
    let tmp2 = asq * tmp1 + 15.0;
    let tmp3 = asq * tmp2;

    alpha * s + tmp3 * a
}
