use firc_hir::{Module, Stmt};

use crate::expr::{render_expr_subst, render_lvalue_subst, Subst};

const INDENT: &str = "    ";

fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// Renders a statement list at the given indentation depth, recursing into
/// `when`/`else when`/`else` bodies one indent level deeper, per
/// `_firrtl.py::_statements`.
///
/// `Stmt::Call` is inlined from `module`'s registered function body at
/// render time rather than at build time, so a helper function used from
/// multiple call sites is only stored once in the IR.
pub fn render_stmts(stmts: &[Stmt], level: usize, module: &Module) -> String {
    let subst = Subst::default();
    let mut out = String::new();
    for stmt in stmts {
        render_stmt(stmt, level, module, &subst, &mut out);
    }
    out
}

fn render_stmt(stmt: &Stmt, level: usize, module: &Module, subst: &Subst, out: &mut String) {
    match stmt {
        Stmt::Connect { lhs, rhs } => {
            out.push_str(&indent(level));
            out.push_str(&format!(
                "{} <= {}\n",
                render_lvalue_subst(lhs, subst),
                render_expr_subst(rhs, subst)
            ));
        }
        Stmt::When { cond, then, else_ifs, otherwise } => {
            out.push_str(&indent(level));
            out.push_str(&format!("when {} :\n", render_expr_subst(cond, subst)));
            out.push_str(&render_stmts_subst(then, level + 1, module, subst));
            for (econd, body) in else_ifs {
                out.push_str(&indent(level));
                out.push_str(&format!("else when {} :\n", render_expr_subst(econd, subst)));
                out.push_str(&render_stmts_subst(body, level + 1, module, subst));
            }
            if let Some(body) = otherwise {
                out.push_str(&indent(level));
                out.push_str("else :\n");
                out.push_str(&render_stmts_subst(body, level + 1, module, subst));
            }
        }
        Stmt::Printf { clock, format, args, enable } => {
            out.push_str(&indent(level));
            let rendered_args: Vec<String> = args.iter().map(|a| render_expr_subst(a, subst)).collect();
            out.push_str(&format!(
                "printf({clock}, {}, \"{}\"{})\n",
                render_expr_subst(enable, subst),
                format,
                prefixed(&rendered_args)
            ));
        }
        Stmt::Assertf { clock, format, args, cond, enable } => {
            out.push_str(&indent(level));
            let rendered_args: Vec<String> = args.iter().map(|a| render_expr_subst(a, subst)).collect();
            out.push_str(&format!(
                "assert({clock}, {}, {}, \"{}\"{})\n",
                render_expr_subst(cond, subst),
                render_expr_subst(enable, subst),
                format,
                prefixed(&rendered_args)
            ));
        }
        Stmt::Coverf { clock, format, cond, enable } => {
            out.push_str(&indent(level));
            out.push_str(&format!(
                "cover({clock}, {}, {}, \"{}\")\n",
                render_expr_subst(cond, subst),
                render_expr_subst(enable, subst),
                format
            ));
        }
        Stmt::Call { name, args } => {
            if let Some(function) = module.functions.get(name) {
                // Binds each parameter name to its already-rendered
                // call-site argument, so the same stored body produces
                // different text at each call, mirroring the decorated
                // Python function executing with that call's actual
                // arguments bound to its parameter names.
                let mut call_subst = subst.clone();
                for (param, arg) in function.params.iter().zip(args.iter()) {
                    call_subst.insert(*param, render_expr_subst(arg, subst));
                }
                out.push_str(&render_stmts_subst(&function.body, level, module, &call_subst));
            }
        }
    }
}

fn render_stmts_subst(stmts: &[Stmt], level: usize, module: &Module, subst: &Subst) -> String {
    let mut out = String::new();
    for stmt in stmts {
        render_stmt(stmt, level, module, subst, &mut out);
    }
    out
}

fn prefixed(args: &[String]) -> String {
    if args.is_empty() {
        String::new()
    } else {
        format!(", {}", args.join(", "))
    }
}
