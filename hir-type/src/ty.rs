use std::fmt;
use std::rc::Rc;

use firc_hir_symbol::Symbol;
use smallvec::SmallVec;

/// A field of a [`Type::Struct`].
///
/// `flip` marks the field as direction-inverted relative to its parent: an
/// `output` struct port with a flipped field drives that field as an input,
/// and vice-versa. This mirrors `hamp`'s `flip()` annotation on struct
/// members.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: Symbol,
    pub ty: Type,
    pub flip: bool,
}

impl Field {
    pub fn new(name: impl Into<Symbol>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            flip: false,
        }
    }

    pub fn flipped(name: impl Into<Symbol>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            flip: true,
        }
    }
}

/// The named, ordered field list backing a `struct` type.
///
/// Wrapped in `Rc` so struct types are cheap to clone once defined, the way
/// a `hamp` `@struct`-decorated class is a single shared definition reused
/// across every port/wire/field declared with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Struct {
    pub name: Symbol,
    fields: Rc<Vec<Field>>,
}

impl Struct {
    pub fn new(name: impl Into<Symbol>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields: Rc::new(fields),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name, honoring `SPEC_FULL.md`'s struct-helper
    /// supplement (`hasmember`/`member` in `_struct.py`).
    pub fn field(&self, name: Symbol) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: Symbol) -> bool {
        self.field(name).is_some()
    }
}

/// The hardware type system (spec §4.1).
///
/// `Type` is a plain value type: two types are the same type exactly when
/// they are `==`, which already captures the "shape" comparison `hamp`
/// performs via its cached, identity-compared `_HWType` instances. There is
/// no separate identity-based cache here — Rust's derived structural
/// equality already gives every caller the comparison they need, and
/// `Type`'s few heap-carrying variants (`Array`, `Struct`) are cheap to
/// clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Unsigned integer of the given bit width.
    Uint(u32),
    /// Two's-complement signed integer of the given bit width.
    Sint(u32),
    /// A single-bit clock signal.
    Clock,
    /// A single-bit reset signal of unspecified polarity/synchronicity.
    ///
    /// Renders as `AsyncReset` in FIRRTL output (see `SPEC_FULL.md` Open
    /// Question 2).
    Reset,
    /// A single-bit asynchronous, active-high reset signal.
    AsyncReset,
    /// A single-bit synchronous, active-high reset signal.
    SyncReset,
    /// A fixed-size array of elements of some other type.
    ///
    /// `Array(elem, n)` builds outer-to-inner: repeated indexing via
    /// [`Type::array`] always nests the new dimension innermost, so
    /// `uint[8].array(4).array(3)` is the FIRRTL type `UInt<8>[4][3]`,
    /// where the first subscript applied (`[4]`) is the outermost
    /// dimension. See `SPEC_FULL.md` Open Question 1.
    Array(Box<Type>, u32),
    /// A named, ordered collection of fields, optionally flipped.
    Struct(Struct),
}

impl Type {
    pub fn uint(width: u32) -> Self {
        Type::Uint(width)
    }

    pub fn sint(width: u32) -> Self {
        Type::Sint(width)
    }

    /// Appends a new array dimension, always as the innermost one.
    ///
    /// Equivalent to the `hamp` convention where the last bracket applied
    /// becomes the deepest dimension: `T[a][b]` has outer size `a`, inner
    /// size `b`. Building `T[a][b]` in this API is `t.array(a).array(b)`.
    pub fn array(self, size: u32) -> Self {
        match self {
            Type::Array(elem, outer) => Type::Array(Box::new(elem.array(size)), outer),
            other => Type::Array(Box::new(other), size),
        }
    }

    /// Total bit width of a value of this type.
    ///
    /// Mirrors `hamp`'s `len(hwtype)` (`_HWType.__len__`/`_Array.__len__`).
    pub fn bitsize(&self) -> u32 {
        match self {
            Type::Uint(w) | Type::Sint(w) => *w,
            Type::Clock | Type::Reset | Type::AsyncReset | Type::SyncReset => 1,
            Type::Array(elem, n) => elem.bitsize() * n,
            Type::Struct(s) => s.fields().iter().map(|f| f.ty.bitsize()).sum(),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Type::Sint(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Uint(_) | Type::Sint(_))
    }

    pub fn is_clock(&self) -> bool {
        matches!(self, Type::Clock)
    }

    /// True for any of the three reset kinds (generic, async, sync).
    ///
    /// Mirrors `_db.py`'s `_rst_types` check, minus the `uint[1]` case
    /// which callers test for separately via [`Type::is_reset_compatible`].
    pub fn is_reset(&self) -> bool {
        matches!(self, Type::Reset | Type::AsyncReset | Type::SyncReset)
    }

    /// True for any type `_db.py::_rst_types` accepts as a register's reset
    /// signal: `reset`, `async_reset`, or `uint[1]`.
    pub fn is_reset_compatible(&self) -> bool {
        self.is_reset() || matches!(self, Type::Uint(1))
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Type::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<(&Type, u32)> {
        match self {
            Type::Array(elem, n) => Some((elem, *n)),
            _ => None,
        }
    }

    /// `equivalent(t1, t2, sizes=false)`: the comparison `connect` uses
    /// (spec §4.1/§4.4) — shape and signedness must match, but integer and
    /// array widths are ignored, unlike strict `==`.
    pub fn equivalent(&self, other: &Type) -> bool {
        self.equivalent_sizes(other, false)
    }

    /// `equivalent(t1, t2, sizes)`: with `sizes = true`, a full deep
    /// structural compare including every integer width and array size;
    /// with `sizes = false`, those widths are ignored.
    pub fn equivalent_sizes(&self, other: &Type, sizes: bool) -> bool {
        match (self, other) {
            (Type::Uint(a), Type::Uint(b)) | (Type::Sint(a), Type::Sint(b)) => !sizes || a == b,
            (Type::Clock, Type::Clock)
            | (Type::Reset, Type::Reset)
            | (Type::AsyncReset, Type::AsyncReset)
            | (Type::SyncReset, Type::SyncReset) => true,
            (Type::Array(a_elem, a_n), Type::Array(b_elem, b_n)) => {
                (!sizes || a_n == b_n) && a_elem.equivalent_sizes(b_elem, sizes)
            }
            (Type::Struct(a), Type::Struct(b)) => {
                a.fields().len() == b.fields().len()
                    && a.fields()
                        .iter()
                        .zip(b.fields())
                        .all(|(fa, fb)| fa.flip == fb.flip && fa.ty.equivalent_sizes(&fb.ty, sizes))
            }
            _ => false,
        }
    }

    /// The legal signed range `[min, max]` for integer types, per
    /// `_hwtypes.py::_set_min_max`.
    pub fn int_range(&self) -> Option<(i128, i128)> {
        match self {
            Type::Uint(w) => Some((0, (1i128 << *w) - 1)),
            Type::Sint(w) => {
                let w = *w as u32;
                Some((-(1i128 << (w - 1)), (1i128 << (w - 1)) - 1))
            }
            _ => None,
        }
    }

    /// All dimensions of a (possibly nested) array type, outermost first,
    /// along with the innermost element type.
    pub fn dims(&self) -> (SmallVec<[u32; 4]>, &Type) {
        let mut dims = SmallVec::new();
        let mut cur = self;
        while let Type::Array(elem, n) = cur {
            dims.push(*n);
            cur = elem;
        }
        (dims, cur)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Uint(w) => write!(f, "uint[{w}]"),
            Type::Sint(w) => write!(f, "sint[{w}]"),
            Type::Clock => write!(f, "clock"),
            Type::Reset => write!(f, "reset"),
            Type::AsyncReset => write!(f, "async_reset"),
            Type::SyncReset => write!(f, "sync_reset"),
            Type::Array(elem, n) => write!(f, "{elem}[{n}]"),
            Type::Struct(s) => write!(f, "{}", s.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_nests_outer_to_inner() {
        // T[4][3]: outer size 4, inner size 3.
        let t = Type::uint(8).array(4).array(3);
        let (dims, elem) = t.dims();
        assert_eq!(dims.as_slice(), &[4, 3]);
        assert_eq!(elem, &Type::uint(8));
        assert_eq!(t.bitsize(), 8 * 4 * 3);
    }

    #[test]
    fn bitsize_of_struct_sums_fields() {
        let s = Struct::new(
            "Data",
            vec![
                Field::new("x", Type::uint(12)),
                Field::new("y", Type::sint(12).array(3)),
            ],
        );
        assert_eq!(Type::Struct(s).bitsize(), 12 + 12 * 3);
    }

    #[test]
    fn equivalent_ignores_widths() {
        assert!(Type::uint(2).equivalent(&Type::uint(2)));
        assert!(Type::uint(2).equivalent(&Type::uint(3)));
        assert!(!Type::uint(2).equivalent(&Type::sint(2)));
        assert!(Type::uint(1).array(10).equivalent(&Type::uint(1).array(4)));
        assert!(!Type::sint(1).array(10).equivalent(&Type::uint(1).array(10)));
    }

    #[test]
    fn equivalent_sizes_true_is_strict() {
        assert!(Type::uint(2).equivalent_sizes(&Type::uint(2), true));
        assert!(!Type::uint(2).equivalent_sizes(&Type::uint(3), true));
        assert!(!Type::uint(1).array(10).equivalent_sizes(&Type::uint(1).array(4), true));
    }

    #[test]
    fn reset_compatible_accepts_uint1() {
        assert!(Type::Reset.is_reset_compatible());
        assert!(Type::AsyncReset.is_reset_compatible());
        assert!(Type::uint(1).is_reset_compatible());
        assert!(!Type::uint(2).is_reset_compatible());
    }
}
