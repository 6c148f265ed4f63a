use firc_hir_symbol::Symbol;

use crate::expr::{Expr, LValue};

/// A single statement in a module's code body (spec §4.2/§4.4).
///
/// Control flow (`When`) nests its branches directly as statement lists,
/// rather than the flat marker-list (`("when", expr)` / `("end_when",)`)
/// `_builder.py`'s older `_CodeBuilder` used — a tree of statements is the
/// natural Rust shape and is what `spec.md` itself describes.
#[derive(Debug, Clone)]
pub enum Stmt {
    Connect { lhs: LValue, rhs: Expr },
    When {
        cond: Expr,
        then: Vec<Stmt>,
        else_ifs: Vec<(Expr, Vec<Stmt>)>,
        otherwise: Option<Vec<Stmt>>,
    },
    Printf { clock: Symbol, format: String, args: Vec<Expr>, enable: Expr },
    Assertf { clock: Symbol, format: String, args: Vec<Expr>, cond: Expr, enable: Expr },
    Coverf { clock: Symbol, format: String, cond: Expr, enable: Expr },
    /// Invokes a helper function registered via `ModuleBuilder::function`
    /// (the `@m.function` supplement, `SPEC_FULL.md` crate-map row for
    /// `firc-hir`), inlining its statements at expansion time.
    Call { name: Symbol, args: Vec<Expr> },
}
