use firc_hir::MEM_CIRCUIT;
use firc_hir_symbol::Symbol;
use firc_hir_type::{Type, TypeError};
use thiserror::Error;

/// A well-formedness violation found while validating a whole
/// [`firc_hir::Database`] (spec §4.6).
///
/// Mirrors the checks `_db.py::validate()` performs over a fully-built
/// circuit set, one layer above the add-time checks `ModuleBuilder`
/// already performs — the same two-layer shape (checked as you build, then
/// checked again as a whole) `hamp` uses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("module `{0}` has an invalid identifier")]
    InvalidIdentifier(Symbol),

    #[error("module `{module}` instantiates unknown module `{target}` in circuit `{circuit}`")]
    UnknownInstanceTarget { module: Symbol, circuit: Symbol, target: Symbol },

    #[error("module `{0}` has zero bit width, which is not a representable hardware type")]
    ZeroWidthType(Symbol),

    #[error("memory `{0}` must have at least one reader, writer, or readwriter port")]
    MemoryWithoutPorts(Symbol),

    #[error("memory `{0}` must have a nonzero depth")]
    MemoryZeroDepth(Symbol),

    #[error("module `{module}`: {source}")]
    Type { module: Symbol, #[source] source: TypeError },

    #[error("module `{0}` output `{1}` is never assigned")]
    UnassignedOutput(Symbol, Symbol),

    #[error("module `{0}`: format string expects {expected} argument(s), found {found}")]
    FormatArityMismatch { module: Symbol, expected: usize, found: usize },

    #[error("module `{module}` register `{register}` reset signal `{signal}` is not reset-compatible")]
    InvalidResetSignal { module: Symbol, register: Symbol, signal: Symbol },

    #[error("module `{module}` register `{register}` reset value is not equivalent to its type")]
    RegisterResetValueMismatch { module: Symbol, register: Symbol },

    #[error("module `{module}` instance `{instance}` has no port `{port}`")]
    UnknownInstancePort { module: Symbol, instance: Symbol, port: Symbol },

    #[error("module `{module}` instance `{instance}` port `{port}` used with the wrong direction")]
    InstancePortDirectionMismatch { module: Symbol, instance: Symbol, port: Symbol },

    #[error("module `{module}`: verification statement clock `{clock}` is not a declared clock")]
    InvalidVerificationClock { module: Symbol, clock: Symbol },
}

pub(crate) fn mem_circuit_symbol() -> Symbol {
    Symbol::intern(MEM_CIRCUIT)
}

/// True for any `Type` containing a zero-sized array or integer, which
/// `_db.py::_validate_type` rejects outright.
pub(crate) fn has_zero_width(ty: &Type) -> bool {
    match ty {
        Type::Uint(0) | Type::Sint(0) => true,
        Type::Array(elem, 0) => {
            let _ = elem;
            true
        }
        Type::Array(elem, _) => has_zero_width(elem),
        Type::Struct(s) => s.fields().iter().any(|f| has_zero_width(&f.ty)),
        _ => false,
    }
}
