use firc_hir_symbol::Symbol;
use firc_hir_type::{Type, TypeError};
use thiserror::Error;

/// Errors raised while building or connecting a [`crate::Database`].
///
/// The four families mirror spec §7: type errors, name errors, index
/// errors, and value errors, each with a `thiserror` message close to the
/// wording `hamp`'s `_db.py`/`_builder.py` raise, since `SPEC_FULL.md`
/// treats those as authoritative where the distilled spec names an error
/// kind without dictating exact text.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch { expected: Type, found: Type },

    #[error("signedness mismatch: `{lhs}` is not compatible with `{rhs}`")]
    SignednessMismatch { lhs: Type, rhs: Type },

    #[error("unknown member `{0}`")]
    UnknownMember(Symbol),

    #[error("member `{0}` already exists")]
    DuplicateMember(Symbol),

    #[error("`{0}` is a reserved name")]
    ReservedName(Symbol),

    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    #[error("index {index} out of bounds for array of size {size}")]
    IndexOutOfBounds { index: u32, size: u32 },

    #[error("`{0}` cannot be indexed, it is not an array")]
    NotIndexable(Type),

    #[error("`{0}` has no field `{1}`")]
    NoSuchField(Type, Symbol),

    #[error("cannot write to `{0}`: it is not writable from this module")]
    NotWritable(Symbol),

    #[error("`{0}` is not a valid reset signal type")]
    InvalidResetType(Type),

    #[error("a register declared with a reset value must have a reset signal")]
    MissingResetSignal,

    #[error("module `{0}` has no clock-typed input to infer a clock from")]
    NoClockInput(Symbol),

    #[error("`{0}` is not a hardware condition")]
    NotAHardwareCondition(Symbol),

    #[error("`else_when`/`otherwise` used without a preceding `when`")]
    DanglingElse,

    #[error("format string expects {expected} argument(s), found {found}")]
    FormatArityMismatch { expected: usize, found: usize },

    #[error(transparent)]
    Type(#[from] TypeError),
}
