//! pyhf JSON format: schema, modifiers, model assembly and likelihood

pub mod channel;
pub mod interp;
pub mod likelihood;
pub mod model;
pub mod modifier;
pub mod options;
pub mod registry;
pub mod schema;
pub mod simplemodels;


pub use channel::*;
pub use interp::{AdditiveCode, MultiplicativeCode};
pub use likelihood::*;
pub use model::*;
pub use modifier::*;
pub use options::BuildOptions;
pub use registry::{ModifierRegistry, Parameter, ParameterTable};
pub use schema::*;
