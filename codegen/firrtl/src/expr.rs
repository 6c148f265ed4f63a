use rustc_hash::FxHashMap;

use firc_hir::{BinaryOp, Expr, ExprKind, LValue, PathElem, UnaryOp};
use firc_hir_symbol::Symbol;
use firc_hir_type::Value;

/// Maps a `@m.function`-style parameter name to the already-rendered
/// argument it was called with, so a function body stored once in the IR
/// renders differently at each call site (`SPEC_FULL.md`'s `firc-hir`
/// crate-map row, grounded on `_module.py::_ModuleFunc`: the decorated
/// function executes with the call's actual arguments bound to its
/// parameter names, rather than acting on a fixed, shared operand).
pub(crate) type Subst = FxHashMap<Symbol, String>;

/// Renders a literal in its typed form, `{UInt|SInt}<N>(v)`, the general
/// case per `_firrtl.py::_expr`'s `k=False` branch (`f"{_type(t)}({v})"`).
fn render_value(value: &Value) -> String {
    match value {
        Value::Int(ty, v) => {
            let mut warned_reset = false;
            format!("{}({v})", crate::types::render_type(ty, &mut warned_reset))
        }
        other => other.to_string(),
    }
}

/// Renders a literal bare, with no type wrapper — only the three immediate-
/// parameter positions FIRRTL treats as constparams rather than operand
/// expressions use this: a constant shift amount, `bits`'s `hi`/`lo`, and
/// `pad`'s `n` (the latter two never reach here, since they're already
/// plain `u32`s rather than `Expr`s).
fn render_bare_value(value: &Value) -> String {
    match value {
        Value::Int(_, v) => v.to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn render_lvalue(lvalue: &LValue) -> String {
    render_lvalue_subst(lvalue, &Subst::default())
}

pub(crate) fn render_lvalue_subst(lvalue: &LValue, subst: &Subst) -> String {
    let mut out = match subst.get(&lvalue.root) {
        Some(replacement) => replacement.clone(),
        None => lvalue.root.to_string(),
    };
    for elem in &lvalue.path {
        match elem {
            PathElem::Field(name) => {
                out.push('.');
                out.push_str(&name.to_string());
            }
            PathElem::ConstIndex(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathElem::Index(idx) => {
                out.push('[');
                out.push_str(&render_expr_subst(idx, subst));
                out.push(']');
            }
        }
    }
    out
}

fn binary_op_name(op: BinaryOp) -> &'static str {
    use BinaryOp::*;
    match op {
        Add => "add",
        Sub => "sub",
        Mul => "mul",
        Div => "div",
        Mod => "rem",
        And => "and",
        Or => "or",
        Xor => "xor",
        Shl => "shl",
        Shr => "shr",
        DShl => "dshl",
        DShr => "dshr",
        Eq => "eq",
        Neq => "neq",
        Lt => "lt",
        Le => "leq",
        Gt => "gt",
        Ge => "geq",
    }
}

fn unary_op_name(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "neg",
        UnaryOp::Not => "not",
        UnaryOp::Cvt => "cvt",
        UnaryOp::OrR => "orr",
        UnaryOp::AndR => "andr",
        UnaryOp::XorR => "xorr",
    }
}

/// Renders an [`Expr`] using the FIRRTL primitive-operation call syntax
/// (`op(args..., constparams...)`), per `_firrtl.py::_op_to_func`/`_expr`.
pub fn render_expr(expr: &Expr) -> String {
    render_expr_subst(expr, &Subst::default())
}

pub(crate) fn render_expr_subst(expr: &Expr, subst: &Subst) -> String {
    match &expr.kind {
        ExprKind::Literal(v) => render_value(v),
        ExprKind::Ref(lvalue) => render_lvalue_subst(lvalue, subst),
        ExprKind::Unary(op, x) => format!("{}({})", unary_op_name(*op), render_expr_subst(x, subst)),
        ExprKind::Binary(op @ (BinaryOp::Shl | BinaryOp::Shr), lhs, rhs) => {
            // The amount is a FIRRTL constant parameter, not an argument
            // expression, for the static-shift primops.
            let amount = match &rhs.kind {
                ExprKind::Literal(v) => render_bare_value(v),
                _ => render_expr_subst(rhs, subst),
            };
            format!("{}({}, {})", binary_op_name(*op), render_expr_subst(lhs, subst), amount)
        }
        ExprKind::Binary(op, lhs, rhs) => {
            format!("{}({}, {})", binary_op_name(*op), render_expr_subst(lhs, subst), render_expr_subst(rhs, subst))
        }
        ExprKind::Cat(lhs, rhs) => format!("cat({}, {})", render_expr_subst(lhs, subst), render_expr_subst(rhs, subst)),
        ExprKind::Bits(x, hi, lo) => format!("bits({}, {}, {})", render_expr_subst(x, subst), hi, lo),
        ExprKind::Pad(x, n) => format!("pad({}, {})", render_expr_subst(x, subst), n),
        // `and_expr`/`or_expr`/`not_expr` first reduce each hardware
        // operand to a single bit (`orr`) before combining, matching the
        // truthiness test a bare `if hwvalue:` performs elsewhere.
        ExprKind::BoolAnd(lhs, rhs) => {
            format!("and(orr({}), orr({}))", render_expr_subst(lhs, subst), render_expr_subst(rhs, subst))
        }
        ExprKind::BoolOr(lhs, rhs) => {
            format!("or(orr({}), orr({}))", render_expr_subst(lhs, subst), render_expr_subst(rhs, subst))
        }
        ExprKind::BoolNot(x) => format!("not(orr({}))", render_expr_subst(x, subst)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firc_hir::LValue;
    use firc_hir_symbol::Symbol;
    use firc_hir_type::Type;

    #[test]
    fn renders_binary_add() {
        let a = Expr::reference(LValue::new(Symbol::intern("x")), Type::uint(8));
        let b = Expr::literal(Value::Int(Type::uint(8), 1));
        let sum = Expr::binary(BinaryOp::Add, a, b).unwrap();
        assert_eq!(render_expr(&sum), "add(x, UInt<8>(1))");
    }

    #[test]
    fn renders_const_shift_amount_bare() {
        let x = Expr::reference(LValue::new(Symbol::intern("x")), Type::uint(8));
        let shifted = Expr::shift_const(BinaryOp::Shl, x, 3).unwrap();
        assert_eq!(render_expr(&shifted), "shl(x, 3)");
    }

    #[test]
    fn renders_field_and_index_path() {
        let lv = LValue::new(Symbol::intern("x")).field(Symbol::intern("a")).const_index(2);
        let e = Expr::reference(lv, Type::uint(8));
        assert_eq!(render_expr(&e), "x.a[2]");
    }
}
