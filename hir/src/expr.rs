use firc_hir_symbol::Symbol;
use firc_hir_type::{Type, Value};
use miden_diagnostics::SourceSpan;

use crate::error::BuildError;

/// A single step along an lvalue path: a struct field access or an array
/// index (the index itself may be a hardware expression).
#[derive(Debug, Clone)]
pub enum PathElem {
    Field(Symbol),
    Index(Box<Expr>),
    ConstIndex(u32),
}

/// A reference to a module member, optionally drilled into via field
/// accesses and/or (possibly dynamic) array indices.
///
/// `x.m1.a`, `x.y[x.sel]`, and `x.r3[x.rsel].a.g[x.gsel][x.zsel]` (the
/// `test_composit_data_types` case) are all `LValue`s: a root member name
/// plus a path of [`PathElem`]s.
#[derive(Debug, Clone)]
pub struct LValue {
    pub root: Symbol,
    pub path: Vec<PathElem>,
}

impl LValue {
    pub fn new(root: Symbol) -> Self {
        Self { root, path: Vec::new() }
    }

    pub fn field(mut self, name: Symbol) -> Self {
        self.path.push(PathElem::Field(name));
        self
    }

    pub fn index(mut self, idx: Expr) -> Self {
        self.path.push(PathElem::Index(Box::new(idx)));
        self
    }

    pub fn const_index(mut self, idx: u32) -> Self {
        self.path.push(PathElem::ConstIndex(idx));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    DShl,
    DShr,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Cvt,
    OrR,
    AndR,
    XorR,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Value),
    Ref(LValue),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Cat(Box<Expr>, Box<Expr>),
    Bits(Box<Expr>, u32, u32),
    Pad(Box<Expr>, u32),
    /// `and_expr`/`or_expr` boolean reduction over hardware operands,
    /// distinct from bitwise [`BinaryOp::And`]/[`BinaryOp::Or`]: each
    /// operand is first reduced to a single bit (`orr`) before combining,
    /// matching `_builder.py`'s `and_expr`/`or_expr`.
    BoolAnd(Box<Expr>, Box<Expr>),
    BoolOr(Box<Expr>, Box<Expr>),
    BoolNot(Box<Expr>),
}

/// A typed hardware expression (spec §4.3).
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub span: Option<SourceSpan>,
}

fn require_same_signedness(lhs: &Type, rhs: &Type) -> Result<(), BuildError> {
    if lhs.is_integer() && rhs.is_integer() && lhs.is_signed() != rhs.is_signed() {
        return Err(BuildError::SignednessMismatch { lhs: lhs.clone(), rhs: rhs.clone() });
    }
    Ok(())
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self { kind, ty, span: None }
    }

    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn literal(value: Value) -> Self {
        let ty = value.ty().clone();
        Expr::new(ExprKind::Literal(value), ty)
    }

    pub fn reference(lvalue: LValue, ty: Type) -> Self {
        Expr::new(ExprKind::Ref(lvalue), ty)
    }

    fn width(&self) -> u32 {
        self.ty.bitsize()
    }

    /// Builds a binary expression, inferring the result width/signedness
    /// per the FIRRTL primitive-op table and rejecting uint/sint mixes,
    /// the rule spec's "Signed/unsigned mix rejection" testable property
    /// (§8) exercises directly.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Result<Expr, BuildError> {
        use BinaryOp::*;
        match op {
            Eq | Neq | Lt | Le | Gt | Ge => {
                require_same_signedness(&lhs.ty, &rhs.ty)?;
                let ty = Type::Uint(1);
                return Ok(Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), ty));
            }
            _ => {}
        }
        require_same_signedness(&lhs.ty, &rhs.ty)?;
        let signed = lhs.ty.is_signed();
        let (w1, w2) = (lhs.width(), rhs.width());
        let width = match op {
            Add | Sub => w1.max(w2) + 1,
            Mul => w1 + w2,
            Div => if signed { w1 + 1 } else { w1 },
            Mod => w1.min(w2),
            And | Or | Xor => w1.max(w2),
            DShl => w1 + ((32 - w2.max(1).leading_zeros()).max(1)),
            DShr => w1,
            // Constant-amount shifts are only constructed via `shift_const`.
            Shl | Shr => unreachable!("constant shifts are built via Expr::shift_const"),
            Eq | Neq | Lt | Le | Gt | Ge => unreachable!(),
        };
        let ty = if signed { Type::Sint(width) } else { Type::Uint(width) };
        Ok(Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), ty))
    }

    /// Builds a shift-by-constant-amount expression, the `<<`/`>>` with a
    /// literal right-hand side case in `test_ops`, distinct from the
    /// dynamic-shift-amount case which widens by the shift amount's own
    /// bit width rather than by the literal value.
    pub fn shift_const(op: BinaryOp, lhs: Expr, amount: u32) -> Result<Expr, BuildError> {
        let signed = lhs.ty.is_signed();
        let w = lhs.width();
        let width = match op {
            BinaryOp::Shl => w + amount,
            BinaryOp::Shr => w.saturating_sub(amount).max(1),
            _ => return Expr::binary(op, lhs, Expr::literal(Value::int(Type::Uint(32), amount as i128)?)),
        };
        let ty = if signed { Type::Sint(width) } else { Type::Uint(width) };
        let rhs = Expr::literal(Value::int(Type::Uint(32), amount as i128)?);
        Ok(Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), ty))
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Result<Expr, BuildError> {
        let signed = operand.ty.is_signed();
        let w = operand.width();
        let ty = match op {
            UnaryOp::Neg => Type::Sint(w + 1),
            UnaryOp::Not => Type::Uint(w),
            UnaryOp::Cvt => if signed { Type::Sint(w) } else { Type::Sint(w + 1) },
            UnaryOp::OrR | UnaryOp::AndR | UnaryOp::XorR => Type::Uint(1),
        };
        Ok(Expr::new(ExprKind::Unary(op, Box::new(operand)), ty))
    }

    /// `cat(a, b, ...)`: right-associative variadic concatenation, per
    /// `_stdlib.py::cat` and `SPEC_FULL.md`'s supplement #5.
    pub fn cat(mut operands: Vec<Expr>) -> Result<Expr, BuildError> {
        let last = operands.pop().ok_or(BuildError::FormatArityMismatch { expected: 1, found: 0 })?;
        operands.into_iter().rev().try_fold(last, |acc, next| {
            let width = next.width() + acc.width();
            Ok(Expr::new(ExprKind::Cat(Box::new(next), Box::new(acc)), Type::Uint(width)))
        })
    }

    pub fn bits(operand: Expr, hi: u32, lo: u32) -> Result<Expr, BuildError> {
        if hi < lo || hi >= operand.width() {
            return Err(BuildError::IndexOutOfBounds { index: hi, size: operand.width() });
        }
        let width = hi - lo + 1;
        Ok(Expr::new(ExprKind::Bits(Box::new(operand), hi, lo), Type::Uint(width)))
    }

    pub fn pad(operand: Expr, width: u32) -> Expr {
        let signed = operand.ty.is_signed();
        let w = operand.width().max(width);
        let ty = if signed { Type::Sint(w) } else { Type::Uint(w) };
        Expr::new(ExprKind::Pad(Box::new(operand), width), ty)
    }

    pub fn and_expr(lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::BoolAnd(Box::new(lhs), Box::new(rhs)), Type::Uint(1))
    }

    pub fn or_expr(lhs: Expr, rhs: Expr) -> Expr {
        Expr::new(ExprKind::BoolOr(Box::new(lhs), Box::new(rhs)), Type::Uint(1))
    }

    pub fn not_expr(operand: Expr) -> Expr {
        Expr::new(ExprKind::BoolNot(Box::new(operand)), Type::Uint(1))
    }
}
