//! The circuit/module intermediate representation: the [`Database`] that
//! holds circuits and modules, the [`expr`] builder for hardware
//! expressions, and the [`module::ModuleBuilder`] that assembles a
//! [`module::Module`]'s ports, wires, registers, instances, and statement
//! body.

pub mod database;
pub mod error;
pub mod expr;
pub mod module;
pub mod stmt;

pub use database::{Circuit, Database, MEM_CIRCUIT};
pub use error::BuildError;
pub use expr::{BinaryOp, Expr, ExprKind, LValue, PathElem, UnaryOp};
pub use module::{resolve_member_type, Direction, Function, Member, Module, ModuleBuilder, RESERVED_NAMES};
pub use stmt::Stmt;
