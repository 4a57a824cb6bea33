//! Probability building blocks for hf-rs.
//!
//! This crate hosts the probability math used by the model assembler and the
//! likelihood constructor:
//! - the Poisson log-density and the likelihood kernel (`poisson`)
//! - the [`Prior`] enum attached to every model parameter

pub mod poisson;
pub mod prior;

pub use prior::Prior;
