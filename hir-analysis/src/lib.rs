//! Whole-database well-formedness validation (spec §4.6): the checks that
//! only make sense once every module in every circuit has been built, as
//! opposed to the add-time checks `firc_hir::ModuleBuilder` already
//! performs on each operation.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{is_driving_input, Validator};
