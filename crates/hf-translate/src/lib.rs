//! # hf-translate
//!
//! Compiles pyhf JSON workspaces into executable numerical pipelines:
//! an `expected(αs)` yield function, one prior per parameter slot and a
//! log-likelihood constructor.

#![warn(clippy::all)]
#![allow(clippy::needless_range_loop)]

pub mod pyhf;

pub use pyhf::*;
