//! The hardware type system.
//!
//! Defines [`Type`], the closed set of hardware value shapes (integers,
//! clock/reset signals, arrays, structs), and [`Value`], a concrete value
//! of a `Type` used for literal construction and default-initialization.

mod ty;
mod value;

pub use ty::{Field, Struct, Type};
pub use value::{TypeError, Value};
