//! Core traits for hf-rs
//!
//! The likelihood constructor only needs "something that maps parameters to
//! expected bin counts"; this seam keeps it independent of the pyhf translator.

use crate::Result;

/// Pure map from a parameter vector to expected per-bin counts.
///
/// Implementations must be side-effect free so that one instance can be
/// evaluated from many threads at once.
pub trait ExpectedYields: Send + Sync {
    /// Number of parameter slots accepted by [`ExpectedYields::expected`].
    fn n_params(&self) -> usize;

    /// Length of the returned vector (total bins across all channels).
    fn n_bins(&self) -> usize;

    /// Expected counts at `params`.
    fn expected(&self, params: &[f64]) -> Result<Vec<f64>>;
}

/// Statistical model trait
pub trait Model: Send + Sync {
    /// Number of parameters
    fn n_parameters(&self) -> usize;

    /// Parameter names
    fn parameter_names(&self) -> Vec<String>;

    /// Parameter bounds (min, max)
    fn parameter_bounds(&self) -> Vec<(f64, f64)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl ExpectedYields for Doubler {
        fn n_params(&self) -> usize {
            1
        }

        fn n_bins(&self) -> usize {
            2
        }

        fn expected(&self, params: &[f64]) -> Result<Vec<f64>> {
            if params.len() != 1 {
                return Err(crate::Error::ParameterCountMismatch { expected: 1, got: params.len() });
            }
            Ok(vec![params[0], 2.0 * params[0]])
        }
    }

    #[test]
    fn test_trait_object_dispatch() {
        let model: Box<dyn ExpectedYields> = Box::new(Doubler);
        assert_eq!(model.n_bins(), 2);
        assert_eq!(model.expected(&[3.0]).unwrap(), vec![3.0, 6.0]);
        assert!(model.expected(&[]).is_err());
    }
}
