//! # hf-core
//!
//! Shared error type and seam traits for hf-rs.
//!
//! Higher crates (`hf-translate`, `hf-cli`) depend on the traits defined here
//! rather than on each other's concrete types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{ExpectedYields, Model};

/// Crate version, shared by every workspace member.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
